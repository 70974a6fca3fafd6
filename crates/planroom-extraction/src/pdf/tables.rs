//! Ruled-table detection.
//!
//! Horizontal and vertical rulings that touch each other are grouped into
//! connected components. A component with at least two distinct horizontal
//! and two distinct vertical positions is treated as a grid; text items are
//! assigned to its cells and each row becomes one line of text.

use std::collections::BTreeMap;

use super::layout::{group_into_lines, lines_to_text, PageLayout, Ruling, TextItem};

/// Slack when deciding whether two rulings touch or share a position.
const SNAP: f32 = 1.5;

struct UnionFind(Vec<usize>);

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind((0..n).collect())
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.0[root] != root {
            root = self.0[root];
        }
        let mut cur = i;
        while self.0[cur] != root {
            let next = self.0[cur];
            self.0[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.0[rb] = ra;
        }
    }
}

fn touches(h: &Ruling, v: &Ruling) -> bool {
    match (h, v) {
        (Ruling::Horizontal { y, x0, x1 }, Ruling::Vertical { x, y0, y1 }) => {
            *x >= x0 - SNAP && *x <= x1 + SNAP && *y >= y0 - SNAP && *y <= y1 + SNAP
        }
        _ => false,
    }
}

/// Sorted positions with near-duplicates merged.
fn distinct(mut values: Vec<f32>) -> Vec<f32> {
    values.sort_by(|a, b| a.total_cmp(b));
    let mut out: Vec<f32> = Vec::new();
    for v in values {
        match out.last() {
            Some(last) if (v - last).abs() <= SNAP => {}
            _ => out.push(v),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    /// Column boundaries, left to right.
    pub xs: Vec<f32>,
    /// Row boundaries, top to bottom.
    pub ys: Vec<f32>,
}

impl Grid {
    fn top(&self) -> f32 {
        self.ys.first().copied().unwrap_or(0.0)
    }

    /// Rows of non-empty cell text, top to bottom.
    pub fn rows(&self, items: &[TextItem]) -> Vec<String> {
        let mut rows = Vec::new();
        for band in self.ys.windows(2) {
            let (top, bottom) = (band[0], band[1]);
            let cells: Vec<String> = self
                .xs
                .windows(2)
                .map(|col| {
                    let inside = items
                        .iter()
                        .filter(|i| i.x >= col[0] && i.x < col[1] && i.y <= top && i.y > bottom)
                        .cloned()
                        .collect();
                    lines_to_text(&group_into_lines(inside)).replace('\n', " ")
                })
                .filter(|cell| !cell.trim().is_empty())
                .collect();
            if !cells.is_empty() {
                rows.push(cells.join(" "));
            }
        }
        rows
    }
}

/// Union every horizontal ruling with the vertical rulings it touches.
/// Verticals are sorted by `x` so each horizontal only visits the verticals
/// inside its own span.
fn connect(rulings: &[Ruling]) -> UnionFind {
    let mut uf = UnionFind::new(rulings.len());

    let mut verticals: Vec<(f32, usize)> = rulings
        .iter()
        .enumerate()
        .filter_map(|(i, r)| match r {
            Ruling::Vertical { x, .. } => Some((*x, i)),
            Ruling::Horizontal { .. } => None,
        })
        .collect();
    verticals.sort_by(|a, b| a.0.total_cmp(&b.0));

    for (i, h) in rulings.iter().enumerate() {
        let Ruling::Horizontal { x0, x1, .. } = h else { continue };
        let from = verticals.partition_point(|(x, _)| *x < x0 - SNAP);
        for &(x, j) in &verticals[from..] {
            if x > x1 + SNAP {
                break;
            }
            if touches(h, &rulings[j]) {
                uf.union(i, j);
            }
        }
    }
    uf
}

/// Grids found among `rulings`, top-most first.
pub fn detect_grids(rulings: &[Ruling]) -> Vec<Grid> {
    let mut uf = connect(rulings);

    let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..rulings.len() {
        components.entry(uf.find(i)).or_default().push(i);
    }

    let mut grids: Vec<Grid> = components
        .into_values()
        .filter_map(|members| {
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for i in members {
                match rulings[i] {
                    Ruling::Horizontal { y, .. } => ys.push(y),
                    Ruling::Vertical { x, .. } => xs.push(x),
                }
            }
            let xs = distinct(xs);
            let mut ys = distinct(ys);
            ys.reverse();
            (xs.len() >= 2 && ys.len() >= 2).then_some(Grid { xs, ys })
        })
        .collect();

    grids.sort_by(|a, b| b.top().total_cmp(&a.top()));
    grids
}

/// Row text for every table on the page.
pub fn table_rows(page: &PageLayout) -> Vec<String> {
    detect_grids(&page.rulings)
        .iter()
        .flat_map(|grid| grid.rows(&page.items))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(y: f32, x0: f32, x1: f32) -> Ruling {
        Ruling::Horizontal { y, x0, x1 }
    }

    fn v(x: f32, y0: f32, y1: f32) -> Ruling {
        Ruling::Vertical { x, y0, y1 }
    }

    fn item(text: &str, x: f32, y: f32) -> TextItem {
        TextItem { text: text.into(), x, y, font_size: 8.0 }
    }

    /// Two rows, two columns between x=300..500 and y=40..100.
    fn two_by_two() -> Vec<Ruling> {
        vec![
            h(100.0, 300.0, 500.0),
            h(70.0, 300.0, 500.0),
            h(40.0, 300.0, 500.0),
            v(300.0, 40.0, 100.0),
            v(400.0, 40.0, 100.0),
            v(500.0, 40.0, 100.0),
        ]
    }

    #[test]
    fn test_detects_grid() {
        let grids = detect_grids(&two_by_two());
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].xs, vec![300.0, 400.0, 500.0]);
        assert_eq!(grids[0].ys, vec![100.0, 70.0, 40.0]);
    }

    #[test]
    fn test_rows_join_non_empty_cells() {
        let page = PageLayout {
            number: 1,
            width: 612.0,
            height: 792.0,
            items: vec![
                item("JOB NO", 305.0, 80.0),
                item("2024-117", 405.0, 80.0),
                item("DRAWN BY", 305.0, 50.0),
            ],
            rulings: two_by_two(),
        };
        assert_eq!(table_rows(&page), vec!["JOB NO 2024-117", "DRAWN BY"]);
    }

    #[test]
    fn test_lone_lines_are_not_tables() {
        let rulings = vec![h(100.0, 0.0, 600.0), h(50.0, 0.0, 600.0), v(700.0, 0.0, 10.0)];
        assert!(detect_grids(&rulings).is_empty());
    }

    #[test]
    fn test_separate_tables_ordered_top_first() {
        let mut rulings = two_by_two();
        rulings.extend([
            h(700.0, 10.0, 100.0),
            h(680.0, 10.0, 100.0),
            v(10.0, 680.0, 700.0),
            v(100.0, 680.0, 700.0),
        ]);
        let grids = detect_grids(&rulings);
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].top(), 700.0);
    }

    #[test]
    fn test_grid_found_among_dense_strokes() {
        let mut rulings = Vec::new();
        // framing-plan hatching: short strokes that never cross
        for k in 0..3000 {
            let offset = (k % 60) as f32 * 9.0;
            let level = 200.0 + (k / 60) as f32 * 9.0;
            rulings.push(h(level, 10.0 + offset, 14.0 + offset));
            rulings.push(v(16.0 + offset, level + 2.0, level + 6.0));
        }
        rulings.extend(two_by_two());

        let grids = detect_grids(&rulings);
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].xs, vec![300.0, 400.0, 500.0]);
    }

    #[test]
    fn test_vertical_just_past_span_still_touches() {
        let rulings = vec![
            h(100.0, 300.0, 500.0),
            h(40.0, 300.0, 500.0),
            v(299.0, 40.0, 100.0),
            v(501.0, 40.0, 100.0),
        ];
        assert_eq!(detect_grids(&rulings).len(), 1);
    }
}
