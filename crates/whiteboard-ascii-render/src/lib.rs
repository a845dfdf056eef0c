use whiteboard_canvas::ViewportState;
use whiteboard_graph::{Direction, EdgeStyle, GraphSnapshot, Node, NodeKind, Point, Rect, Size};
use whiteboard_layout::route_edge;

#[derive(Debug, Clone)]
pub struct AsciiRenderOptions {
    /// Grid size in characters.
    pub columns: usize,
    pub rows: usize,
    /// Screen pixels covered by one character cell.
    pub cell_width: f32,
    pub cell_height: f32,
    pub node_size: Size,
    pub direction: Direction,
}

impl Default for AsciiRenderOptions {
    fn default() -> Self {
        Self {
            columns: 120,
            rows: 40,
            cell_width: 8.0,
            cell_height: 16.0,
            node_size: Size::new(280.0, 150.0),
            direction: Direction::TB,
        }
    }
}

impl AsciiRenderOptions {
    /// Screen area, in pixels, that the grid covers.
    pub fn screen_size(&self) -> Size {
        Size::new(
            self.columns as f32 * self.cell_width,
            self.rows as f32 * self.cell_height,
        )
    }
}

/// How a node kind is drawn in text mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindHints {
    pub glyph: char,
    pub corner: char,
}

pub fn kind_hints(kind: NodeKind) -> KindHints {
    let (glyph, corner) = match kind {
        NodeKind::Problem => ('!', '#'),
        NodeKind::Hypothesis => ('*', '+'),
        NodeKind::Pillar => ('#', '+'),
        NodeKind::Evidence => ('~', '+'),
        NodeKind::Risk => ('^', '+'),
        NodeKind::Solution => ('>', '+'),
        NodeKind::Trigger => ('@', '+'),
        NodeKind::Action => ('=', '+'),
    };
    KindHints { glyph, corner }
}

/// Draws the snapshot as seen through `viewport`. Anything outside the grid
/// is clipped.
pub fn render_ascii(
    snapshot: &GraphSnapshot,
    viewport: &ViewportState,
    options: &AsciiRenderOptions,
) -> String {
    if snapshot.nodes.is_empty() {
        return String::new();
    }

    let mut grid = vec![vec![' '; options.columns.max(1)]; options.rows.max(1)];

    // Edges first so nodes appear on top.
    for edge in &snapshot.edges {
        let (Some(source), Some(target)) =
            (snapshot.node(edge.source), snapshot.node(edge.target))
        else {
            continue;
        };
        let points = route_edge(
            source.bounds(options.node_size),
            target.bounds(options.node_size),
            options.direction,
        );
        for segment in points.windows(2) {
            let (x1, y1) = map_point(segment[0], viewport, options);
            let (x2, y2) = map_point(segment[1], viewport, options);
            draw_line(&mut grid, x1, y1, x2, y2, edge.style);
        }
    }

    for node in &snapshot.nodes {
        draw_node(&mut grid, node, viewport, options);
    }

    let lines: Vec<String> = grid
        .into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect();
    let used = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(0, |last| last + 1);
    lines[..used].join("\n")
}

fn map_point(point: Point, viewport: &ViewportState, options: &AsciiRenderOptions) -> (i32, i32) {
    let screen = viewport.graph_to_screen(point);
    let x = (screen.x / options.cell_width).round() as i32;
    let y = (screen.y / options.cell_height).round() as i32;
    (x, y)
}

fn draw_node(
    grid: &mut [Vec<char>],
    node: &Node,
    viewport: &ViewportState,
    options: &AsciiRenderOptions,
) {
    let rect: Rect = node.bounds(options.node_size);
    let (left, top) = map_point(Point::new(rect.x, rect.y), viewport, options);
    let bottom_right = Point::new(rect.right(), rect.bottom());
    let (mut right, mut bottom) = map_point(bottom_right, viewport, options);
    right = right.max(left + 2);
    bottom = bottom.max(top + 2);

    let hints = kind_hints(node.kind);
    for y in top..=bottom {
        for x in left..=right {
            let ch = match (x == left || x == right, y == top || y == bottom) {
                (true, true) => hints.corner,
                (false, true) => '-',
                (true, false) => '|',
                (false, false) => ' ',
            };
            put_cell(grid, x, y, ch);
        }
    }

    let available = (right - left - 1).max(0) as usize;
    let header = format!("{} {}", hints.glyph, node.payload.label);
    write_text(grid, left + 1, top + 1, &header, available);
    if bottom - top >= 3 && !node.payload.content.is_empty() {
        write_text(grid, left + 1, top + 2, &node.payload.content, available);
    }
    if bottom - top >= 4 {
        if let Some(sub) = &node.payload.sub_content {
            write_text(grid, left + 1, top + 3, sub, available);
        }
    }
}

fn write_text(grid: &mut [Vec<char>], x: i32, y: i32, text: &str, available: usize) {
    for (idx, ch) in text.chars().take(available).enumerate() {
        put_cell(grid, x + idx as i32, y, ch);
    }
}

fn draw_line(grid: &mut [Vec<char>], x1: i32, y1: i32, x2: i32, y2: i32, style: EdgeStyle) {
    let (horizontal, vertical) = match style {
        EdgeStyle::Solid => ('-', '|'),
        EdgeStyle::Dashed => ('.', ':'),
    };

    if x1 == x2 {
        let (start, end) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        for y in start..=end {
            set_cell(grid, x1, y, vertical);
        }
        return;
    }

    if y1 == y2 {
        let (start, end) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        for x in start..=end {
            set_cell(grid, x, y1, horizontal);
        }
        return;
    }

    // Manhattan corner: draw two segments.
    draw_line(grid, x1, y1, x1, y2, style);
    draw_line(grid, x1, y2, x2, y2, style);
    set_cell(grid, x1, y2, '+');
}

fn cell_mut(grid: &mut [Vec<char>], x: i32, y: i32) -> Option<&mut char> {
    if y < 0 || x < 0 {
        return None;
    }
    grid.get_mut(y as usize)?.get_mut(x as usize)
}

fn put_cell(grid: &mut [Vec<char>], x: i32, y: i32, ch: char) {
    if let Some(cell) = cell_mut(grid, x, y) {
        *cell = ch;
    }
}

fn set_cell(grid: &mut [Vec<char>], x: i32, y: i32, ch: char) {
    if let Some(cell) = cell_mut(grid, x, y) {
        *cell = merge_char(*cell, ch);
    }
}

fn is_line(ch: char) -> bool {
    matches!(ch, '-' | '|' | '.' | ':' | '+')
}

fn merge_char(existing: char, incoming: char) -> char {
    if existing == ' ' || existing == incoming {
        return incoming;
    }
    if !is_line(existing) {
        return existing;
    }
    match (existing, incoming) {
        ('-' | '.', '|' | ':') | ('|' | ':', '-' | '.') => '+',
        ('+', _) | (_, '+') => '+',
        _ => incoming,
    }
}
