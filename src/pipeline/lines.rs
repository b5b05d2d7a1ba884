//! Line reconstruction: positioned words → reading-order lines.
//!
//! The document reader hands us a bag of words with bounding boxes and no
//! usable order. Lines are recovered from geometry alone:
//!
//! 1. sort by `(y0, x0)`, ties broken by `x1`, `y1` and text;
//! 2. walk the words keeping a running vertical centre for the open line;
//!    a word joins when its centre is within `y_tolerance` of that running
//!    mean, otherwise the line is closed;
//! 3. inside each line, re-sort by `x0` and glue words together, inserting a
//!    space only when the horizontal gap exceeds `word_gap`.
//!
//! Averaging the centres of every word already in the line lets the band
//! follow a slightly drifting baseline instead of the first word's centre.
//! The small-gap rule rejoins words that the PDF split in the middle because
//! of kerning.

use crate::error::PageError;
use crate::pipeline::reader::PositionedWord;

/// Words that share one vertical band, in left-to-right order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedLine<'a> {
    pub words: Vec<&'a PositionedWord>,
}

impl ReconstructedLine<'_> {
    /// Render the line, inserting a single space between two words only when
    /// `next.x0 - prev.x1 > word_gap`.
    pub fn render(&self, word_gap: f64) -> String {
        let mut text = String::new();
        let mut prev_x1: Option<f64> = None;
        for word in &self.words {
            if let Some(x1) = prev_x1 {
                if word.x0 - x1 > word_gap {
                    text.push(' ');
                }
            }
            text.push_str(&word.text);
            prev_x1 = Some(word.x1);
        }
        text
    }
}

/// Remaining keys that make both sorts total, so input order never leaks
/// into the output.
fn tie_break(a: &PositionedWord, b: &PositionedWord) -> std::cmp::Ordering {
    a.x1.total_cmp(&b.x1)
        .then(a.y1.total_cmp(&b.y1))
        .then_with(|| a.text.cmp(&b.text))
}

/// Group the words of one page into lines (top to bottom).
///
/// Every word must have finite coordinates; a NaN or infinite value makes the
/// whole page fail so it can be skipped by the caller.
pub fn group_lines(
    words: &[PositionedWord],
    y_tolerance: f64,
) -> Result<Vec<ReconstructedLine<'_>>, PageError> {
    if let Some(bad) = words.iter().find(|w| !w.is_finite()) {
        return Err(PageError::InvalidGeometry {
            page: bad.page_index + 1,
            word: bad.text.clone(),
        });
    }

    let mut sorted: Vec<&PositionedWord> = words.iter().collect();
    sorted.sort_by(|a, b| {
        a.y0.total_cmp(&b.y0)
            .then(a.x0.total_cmp(&b.x0))
            .then_with(|| tie_break(a, b))
    });

    let mut lines: Vec<Vec<&PositionedWord>> = Vec::new();
    let mut current: Vec<&PositionedWord> = Vec::new();
    let mut current_y: Option<f64> = None;

    for word in sorted {
        let center = word.y_center();
        match current_y {
            Some(y) if (center - y).abs() > y_tolerance => {
                lines.push(std::mem::take(&mut current));
                current.push(word);
                current_y = Some(center);
            }
            _ => {
                current.push(word);
                let sum: f64 = current.iter().map(|w| w.y_center()).sum();
                current_y = Some(sum / current.len() as f64);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    Ok(lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| {
                a.x0.total_cmp(&b.x0)
                    .then(a.y0.total_cmp(&b.y0))
                    .then_with(|| tie_break(a, b))
            });
            ReconstructedLine { words: line }
        })
        .collect())
}

/// Reconstruct the page's reading-order lines as strings.
///
/// Lines whose text is blank are dropped.
pub fn reconstruct_lines(
    words: &[PositionedWord],
    y_tolerance: f64,
    word_gap: f64,
) -> Result<Vec<String>, PageError> {
    Ok(group_lines(words, y_tolerance)?
        .iter()
        .map(|line| line.render(word_gap))
        .filter(|text| !text.trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> PositionedWord {
        PositionedWord::new(text, x0, y0, x1, y1)
    }

    #[test]
    fn groups_words_by_vertical_band() {
        let words = vec![
            word("orden", 60.0, 10.0, 90.0, 20.0),
            word("Número", 10.0, 11.0, 55.0, 21.0),
            word("Clase", 10.0, 40.0, 40.0, 50.0),
        ];
        let lines = reconstruct_lines(&words, 5.0, 1.0).unwrap();
        assert_eq!(lines, vec!["Número orden", "Clase"]);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut words = vec![
            word("B", 30.0, 10.0, 40.0, 20.0),
            word("A", 10.0, 10.0, 20.0, 20.0),
            word("C", 10.0, 30.0, 20.0, 40.0),
        ];
        let first = reconstruct_lines(&words, 5.0, 1.0).unwrap();
        words.reverse();
        let second = reconstruct_lines(&words, 5.0, 1.0).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec!["A B", "C"]);
    }

    #[test]
    fn words_sharing_an_origin_render_the_same_in_any_order() {
        let wide = word("A", 10.0, 10.0, 20.0, 20.0);
        let narrow = word("B", 10.0, 10.0, 15.0, 20.0);
        let forward = reconstruct_lines(&[wide.clone(), narrow.clone()], 5.0, 1.0).unwrap();
        let backward = reconstruct_lines(&[narrow, wide], 5.0, 1.0).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, vec!["BA"]);
    }

    #[test]
    fn identical_boxes_fall_back_to_text_order() {
        let words = vec![
            word("y", 10.0, 10.0, 20.0, 20.0),
            word("x", 10.0, 10.0, 20.0, 20.0),
        ];
        let mut reversed = words.clone();
        reversed.reverse();
        assert_eq!(reconstruct_lines(&words, 5.0, 1.0).unwrap(), vec!["xy"]);
        assert_eq!(reconstruct_lines(&reversed, 5.0, 1.0).unwrap(), vec!["xy"]);
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let words = vec![
            word("T1", 10.0, 10.0, 20.0, 20.0),
            word("body", 25.0, 12.0, 50.0, 22.0),
            word("next", 10.0, 50.0, 30.0, 60.0),
        ];
        assert_eq!(
            reconstruct_lines(&words, 5.0, 1.0).unwrap(),
            reconstruct_lines(&words, 5.0, 1.0).unwrap()
        );
    }

    #[test]
    fn gap_of_exactly_one_unit_glues_words() {
        let words = vec![
            word("Manten", 10.0, 10.0, 40.0, 20.0),
            word("imiento", 41.0, 10.0, 70.0, 20.0),
        ];
        assert_eq!(reconstruct_lines(&words, 5.0, 1.0).unwrap(), vec!["Mantenimiento"]);
    }

    #[test]
    fn gap_just_above_one_unit_inserts_one_space() {
        let words = vec![
            word("Frec.", 10.0, 10.0, 40.0, 20.0),
            word("Dias", 41.01, 10.0, 70.0, 20.0),
        ];
        assert_eq!(reconstruct_lines(&words, 5.0, 1.0).unwrap(), vec!["Frec. Dias"]);
    }

    #[test]
    fn running_mean_follows_baseline_drift() {
        // centres 15, 19, 21: "c" is 6 away from "a" but within 5 of the mean 17
        let words = vec![
            word("a", 10.0, 10.0, 15.0, 20.0),
            word("b", 20.0, 14.0, 25.0, 24.0),
            word("c", 30.0, 16.0, 35.0, 26.0),
        ];
        assert_eq!(reconstruct_lines(&words, 5.0, 1.0).unwrap(), vec!["a b c"]);
    }

    #[test]
    fn word_outside_tolerance_starts_new_line() {
        // centres 15 and 20.5: 5.5 apart
        let words = vec![
            word("up", 10.0, 10.0, 20.0, 20.0),
            word("down", 10.0, 15.5, 30.0, 25.5),
        ];
        assert_eq!(reconstruct_lines(&words, 5.0, 1.0).unwrap(), vec!["up", "down"]);
    }

    #[test]
    fn line_count_matches_vertical_clusters() {
        let mut words = Vec::new();
        for row in 0..7 {
            let y = row as f64 * 20.0;
            for col in 0..3 {
                let x = col as f64 * 30.0;
                words.push(word("w", x, y, x + 10.0, y + 8.0));
            }
        }
        let lines = group_lines(&words, 5.0).unwrap();
        assert_eq!(lines.len(), 7);
        assert!(lines.iter().all(|l| l.words.len() == 3));
    }

    #[test]
    fn blank_lines_are_dropped() {
        let words = vec![
            word(" ", 10.0, 10.0, 12.0, 20.0),
            word("texto", 10.0, 40.0, 40.0, 50.0),
        ];
        assert_eq!(reconstruct_lines(&words, 5.0, 1.0).unwrap(), vec!["texto"]);
    }

    #[test]
    fn empty_page_has_no_lines() {
        assert!(reconstruct_lines(&[], 5.0, 1.0).unwrap().is_empty());
    }

    #[test]
    fn non_finite_geometry_fails_the_page() {
        let mut bad = word("x", f64::NAN, 10.0, 20.0, 20.0);
        bad.page_index = 2;
        let err = reconstruct_lines(&[bad], 5.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            PageError::InvalidGeometry {
                page: 3,
                word: "x".into()
            }
        );
    }
}
