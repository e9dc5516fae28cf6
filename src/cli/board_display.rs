use crate::board::{Board, Cell};
use crate::types::Category;

/// One-character cell rendering: owners print their symbol, event cells the
/// lowercase initial of their category, blocked cells a hash.
pub fn cell_glyph(cell: &Cell) -> char {
    if cell.blocked {
        return '#';
    }
    if let Some(symbol) = cell.owner {
        return symbol.as_char();
    }
    if let Some(category) = cell.category {
        return category_glyph(category);
    }
    '.'
}

pub fn category_glyph(category: Category) -> char {
    match category {
        Category::Bonus => 'b',
        Category::Warning => 'w',
        Category::Challenge => 'c',
        Category::Danger => 'd',
        Category::Special => 's',
    }
}

/// Plain-text board with row and column headers; protected cells carry a
/// trailing asterisk. The TUI styles cells itself, this string form serves
/// the simulator and logs.
pub fn render_board(board: &Board) -> String {
    let mut out = String::new();
    out.push_str("    ");
    for col in 0..board.size() {
        out.push_str(&format!("{col:>3}"));
    }
    out.push('\n');

    for row in 0..board.size() {
        let mut line = format!("{row:>3} ");
        for col in 0..board.size() {
            let pos = crate::board::Position::new(row, col);
            let cell = match board.cell(pos) {
                Some(cell) => cell,
                None => continue,
            };
            let marker = if cell.protected { '*' } else { ' ' };
            line.push(' ');
            line.push(cell_glyph(cell));
            line.push(marker);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use crate::events::catalog::EventKind;
    use crate::types::Symbol;

    #[test]
    fn glyphs_cover_every_cell_state() {
        let mut board = Board::new(3);
        board.set_owner(Position::new(0, 0), Symbol::new('A'));
        board.set_event(Position::new(0, 1), Category::Danger, Some(EventKind::NukeArea));
        board.set_blocked(Position::new(0, 2));

        assert_eq!(cell_glyph(board.cell(Position::new(0, 0)).unwrap()), 'A');
        assert_eq!(cell_glyph(board.cell(Position::new(0, 1)).unwrap()), 'd');
        assert_eq!(cell_glyph(board.cell(Position::new(0, 2)).unwrap()), '#');
        assert_eq!(cell_glyph(board.cell(Position::new(1, 1)).unwrap()), '.');
    }

    #[test]
    fn rendered_board_carries_headers_and_markers() {
        let mut board = Board::new(3);
        board.set_owner(Position::new(1, 0), Symbol::new('B'));
        board.set_protected(Position::new(1, 0));
        board.set_event(Position::new(2, 2), Category::Bonus, None);

        let text = render_board(&board);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4, "header plus three rows");
        assert!(lines[0].contains('0') && lines[0].contains('2'));
        assert!(lines[2].contains("B*"), "protected owner keeps its marker");
        assert!(lines[3].ends_with('b'));
    }
}
