//! ANSI rendering of the annotated line stream.
//!
//! All color choices live in an immutable [`Palette`] threaded through the
//! renderer, keeping the pipeline pure and the colors overridable by library
//! callers. Backgrounds are extended to the right margin with an
//! erase-to-end-of-line sequence instead of space padding, so resizing the
//! terminal does not tear the colored bars.

use std::ops::Range;

use anstyle::{Ansi256Color, Effects, Style};

use crate::classify::{DiffLine, LineKind};

/// Erase from the cursor to the end of the line, extending the active
/// background color without emitting padding characters.
pub const ERASE_LINE: &str = "\x1b[K";

const RESET: &str = "\x1b[0m";

/// Index an RGB triple (each component in 0..6) into the xterm-256 color cube.
pub fn rgb6(r: u8, g: u8, b: u8) -> Ansi256Color {
    debug_assert!(r < 6 && g < 6 && b < 6);
    Ansi256Color(16 + 36 * r + 6 * g + b)
}

/// Grayscale ramp over 26 steps: 0 is black, 25 is white, the rest map onto
/// the 24 dedicated grayscale palette entries.
pub fn gray26(n: u8) -> Ansi256Color {
    debug_assert!(n < 26);
    match n {
        0 => Ansi256Color(16),
        25 => Ansi256Color(231),
        n => Ansi256Color(231 + n),
    }
}

fn fg(color: Ansi256Color) -> Style {
    Style::new().fg_color(Some(color.into()))
}

fn bg(color: Ansi256Color) -> Style {
    Style::new().bg_color(Some(color.into()))
}

/// The fixed color scheme, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct Palette {
    pub file: Style,
    pub meta: Style,
    pub location: Style,
    pub section: Style,
    pub removed: Style,
    pub added: Style,
    pub removed_ws: Style,
    pub added_ws: Style,
    pub removed_moved: Style,
    pub added_moved: Style,
    pub removed_token: Style,
    pub added_token: Style,
    pub dropped: Style,
    pub escape: Style,
}

impl Default for Palette {
    fn default() -> Self {
        let removed_bg = rgb6(1, 0, 0);
        let added_bg = rgb6(0, 1, 0);
        Palette {
            file: bg(rgb6(1, 0, 1)),
            meta: bg(rgb6(0, 3, 4)),
            location: bg(rgb6(0, 1, 2)),
            section: fg(gray26(17)).bg_color(Some(gray26(4).into())),
            removed: fg(rgb6(5, 0, 0)).bg_color(Some(removed_bg.into())),
            added: fg(rgb6(0, 5, 0)).bg_color(Some(added_bg.into())),
            removed_ws: bg(removed_bg),
            added_ws: bg(added_bg),
            removed_moved: fg(rgb6(2, 0, 0)),
            added_moved: fg(rgb6(0, 2, 0)),
            removed_token: fg(gray26(25))
                .bg_color(Some(removed_bg.into()))
                .effects(Effects::BOLD),
            added_token: fg(gray26(25))
                .bg_color(Some(added_bg.into()))
                .effects(Effects::BOLD),
            dropped: fg(gray26(10)),
            escape: Style::new().effects(Effects::INVERT),
        }
    }
}

/// Replacement glyph for an invisible character, if it needs one.
///
/// C0 controls (tab included) and DEL have Unicode control pictures; the
/// Latin-1 C1 range has none and falls back to a hex pair.
fn escape_glyph(c: char) -> Option<String> {
    let code = c as u32;
    match code {
        0x00..=0x1f => char::from_u32(0x2400 + code).map(String::from),
        0x7f => Some("\u{2421}".to_string()),
        0x80..=0x9f => Some(format!("<{code:02X}>")),
        _ => None,
    }
}

/// Streaming line renderer. Tracks the current file path for header and
/// metadata reformatting.
#[derive(Debug)]
pub struct Renderer<'a> {
    palette: &'a Palette,
    interactive: bool,
    path: String,
}

impl<'a> Renderer<'a> {
    pub fn new(palette: &'a Palette, interactive: bool) -> Self {
        Renderer {
            palette,
            interactive,
            path: "<path>".to_string(),
        }
    }

    /// Render one line. `None` means the line is omitted (only ever happens
    /// for Dropped lines outside interactive mode).
    pub fn render_line(
        &mut self,
        line: &DiffLine,
        highlights: Option<&[Range<usize>]>,
    ) -> Option<String> {
        let p = self.palette;
        match &line.kind {
            LineKind::Other | LineKind::Commit => Some(line.raw.clone()),
            LineKind::FileHeader { old_path, new_path } => {
                self.path = if new_path.contains('/') {
                    new_path.clone()
                } else {
                    format!("./{new_path}")
                };
                let msg = if old_path == new_path {
                    self.path.clone()
                } else {
                    format!("{old_path} -> {new_path}")
                };
                Some(format!("{}{msg}{ERASE_LINE}{RESET}", p.file))
            }
            LineKind::HunkHeader {
                nums: Some(h),
                section,
            } => {
                let mut out = format!("{}{}:{}:{RESET}", p.location, self.path, h.new_start);
                if !section.is_empty() {
                    out.push(' ');
                    out.push_str(&p.section.to_string());
                    out.push_str(section);
                    out.push_str(RESET);
                }
                Some(out)
            }
            LineKind::HunkHeader { nums: None, .. } => {
                // Unparsable ranges: show the raw header, still muted
                Some(format!("{}{}{RESET}", p.location, line.text))
            }
            LineKind::Meta => Some(format!("{}{}:{RESET} {}", p.meta, self.path, line.raw)),
            LineKind::Dropped => {
                // Interactive consumers slice output by absolute line
                // position, so the line count must not change
                if self.interactive {
                    Some(format!("{}{}{RESET}", p.dropped, line.text))
                } else {
                    None
                }
            }
            LineKind::Context => {
                let mut out = String::new();
                self.push_escaped(&mut out, &line.text, None);
                Some(out)
            }
            LineKind::Added | LineKind::Removed => {
                let added = line.kind == LineKind::Added;
                let (base, ws, moved, accent) = if added {
                    (&p.added, &p.added_ws, &p.added_moved, &p.added_token)
                } else {
                    (&p.removed, &p.removed_ws, &p.removed_moved, &p.removed_token)
                };
                let body = line.text.as_str();
                if body.is_empty() {
                    Some(format!("{ws}{ERASE_LINE}{RESET}"))
                } else if body.trim().is_empty() {
                    let mut out = ws.to_string();
                    self.push_escaped(&mut out, body, Some(ws));
                    out.push_str(ERASE_LINE);
                    out.push_str(RESET);
                    Some(out)
                } else if line.move_group.is_some() {
                    let mut out = moved.to_string();
                    self.push_escaped(&mut out, body, Some(moved));
                    out.push_str(RESET);
                    Some(out)
                } else {
                    Some(self.paint_body(body, base, accent, highlights.unwrap_or(&[])))
                }
            }
        }
    }

    /// Body with background color, accent spans and a trailing erase.
    fn paint_body(&self, body: &str, base: &Style, accent: &Style, spans: &[Range<usize>]) -> String {
        let mut out = base.to_string();
        let mut pos = 0;
        for span in spans {
            let start = span.start.min(body.len());
            let end = span.end.min(body.len());
            if start > pos {
                self.push_escaped(&mut out, &body[pos..start], Some(base));
            }
            out.push_str(RESET);
            out.push_str(&accent.to_string());
            self.push_escaped(&mut out, &body[start..end], Some(accent));
            out.push_str(RESET);
            out.push_str(&base.to_string());
            pos = end;
        }
        self.push_escaped(&mut out, &body[pos..], Some(base));
        out.push_str(ERASE_LINE);
        out.push_str(RESET);
        out
    }

    /// Append text, swapping invisible characters for inverted-video glyphs.
    /// `restore` is re-applied after each glyph resets the attributes.
    fn push_escaped(&self, out: &mut String, text: &str, restore: Option<&Style>) {
        for c in text.chars() {
            match escape_glyph(c) {
                None => out.push(c),
                Some(glyph) => {
                    out.push_str(&self.palette.escape.to_string());
                    out.push_str(&glyph);
                    out.push_str(RESET);
                    if let Some(style) = restore {
                        out.push_str(&style.to_string());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::classify_all;
    use similar_asserts::assert_eq;

    fn render_all(input: &str, interactive: bool) -> Vec<String> {
        let palette = Palette::default();
        let mut renderer = Renderer::new(&palette, interactive);
        classify_all(input)
            .iter()
            .filter_map(|line| renderer.render_line(line, None))
            .collect()
    }

    fn strip(line: &str) -> String {
        crate::classify::strip_sgr(line).replace(ERASE_LINE, "")
    }

    const HEADER: &str = "\
diff --git a/src/a.py b/src/a.py
index abc..def 100644
--- a/src/a.py
+++ b/src/a.py
@@ -10,3 +10,4 @@
";

    #[test]
    fn hunk_header_becomes_path_and_line() {
        let out = render_all(HEADER, false);
        // index/---/+++ are dropped in normal mode
        assert_eq!(out.len(), 2);
        assert_eq!(strip(&out[1]), "src/a.py:10:");
    }

    #[test]
    fn hunk_section_text_is_kept() {
        let input = "diff --git a/src/f.c b/src/f.c\n@@ -1,2 +3,4 @@ int main(void)\n";
        let out = render_all(input, false);
        assert_eq!(strip(&out[1]), "src/f.c:3: int main(void)");
    }

    #[test]
    fn slashless_path_gets_dot_prefix() {
        let input = "diff --git a/Makefile b/Makefile\n@@ -1,1 +2,2 @@\n";
        let out = render_all(input, false);
        assert_eq!(strip(&out[0]), "./Makefile");
        assert_eq!(strip(&out[1]), "./Makefile:2:");
    }

    #[test]
    fn rename_shows_both_paths() {
        let out = render_all("diff --git a/old.rs b/new.rs\n", false);
        assert_eq!(strip(&out[0]), "old.rs -> new.rs");
    }

    #[test]
    fn interactive_keeps_every_line() {
        let out = render_all(HEADER, true);
        assert_eq!(out.len(), HEADER.lines().count());
        assert_eq!(strip(&out[1]), "index abc..def 100644");
    }

    #[test]
    fn markers_are_stripped_from_bodies() {
        let input = "diff --git a/f b/f\n@@ -1,2 +1,2 @@\n ctx body\n-old body\n+new body\n";
        let out = render_all(input, false);
        assert_eq!(out[2], "ctx body");
        assert_eq!(strip(&out[3]), "old body");
        assert_eq!(strip(&out[4]), "new body");
    }

    #[test]
    fn added_line_carries_background_and_erase() {
        let input = "diff --git a/f b/f\n@@ -1,0 +1,1 @@\n+fresh\n";
        let out = render_all(input, false);
        let added = &out[2];
        assert!(added.contains("fresh"));
        assert!(added.contains(ERASE_LINE));
        assert!(added.ends_with(RESET));
        // 256-color background for the added side
        assert!(added.contains("48;5;"));
    }

    #[test]
    fn moved_line_has_no_background() {
        let palette = Palette::default();
        let mut renderer = Renderer::new(&palette, false);
        let mut lines = classify_all("diff --git a/f b/f\n@@ -1,1 +1,0 @@\n-went elsewhere\n");
        lines[2].move_group = Some(0);
        let out = renderer.render_line(&lines[2], None).unwrap();
        assert!(out.contains("went elsewhere"));
        assert!(!out.contains("48;5;"));
        assert!(!out.contains(ERASE_LINE));
    }

    #[test]
    fn token_spans_switch_styles_mid_line() {
        let palette = Palette::default();
        let mut renderer = Renderer::new(&palette, false);
        let lines = classify_all("diff --git a/f b/f\n@@ -1,1 +1,1 @@\n-x = 1\n");
        let out = renderer.render_line(&lines[2], Some(&[4..5])).unwrap();
        assert_eq!(strip(&out), "x = 1");
        // bold accent applied somewhere inside
        assert!(out.contains("1m") || out.contains(";1;"));
    }

    #[test]
    fn tab_is_rendered_as_a_visible_glyph() {
        let input = "diff --git a/f b/f\n@@ -1,0 +1,1 @@\n+col1\tcol2\n";
        let out = render_all(input, false);
        assert!(out[2].contains('\u{2409}'));
        assert!(!out[2].contains('\t'));
    }

    #[test]
    fn control_characters_are_never_dropped() {
        let input = "diff --git a/f b/f\n@@ -1,0 +1,1 @@\n+a\u{7}b\u{7f}c\n";
        let out = render_all(input, false);
        assert!(out[2].contains('\u{2407}'));
        assert!(out[2].contains('\u{2421}'));
        assert_eq!(strip(&out[2]), "a\u{2407}b\u{2421}c");
    }

    #[test]
    fn c1_controls_render_as_inverted_hex_pairs() {
        let input = "diff --git a/f b/f\n@@ -1,0 +1,1 @@\n+a\u{85}b\n";
        let out = render_all(input, false);
        assert!(!out[2].contains('\u{85}'));
        // no control picture exists for C1, so the glyph is a hex pair in
        // inverted video
        assert!(out[2].contains("\u{1b}[7m<85>"));
        assert_eq!(strip(&out[2]), "a<85>b");
    }

    #[test]
    fn empty_added_body_is_a_colored_bar() {
        let input = "diff --git a/f b/f\n@@ -1,0 +1,1 @@\n+\n";
        let out = render_all(input, false);
        assert!(out[2].contains(ERASE_LINE));
        assert_eq!(strip(&out[2]), "");
    }

    #[test]
    fn whitespace_only_body_shows_its_characters() {
        let input = "diff --git a/f b/f\n@@ -1,1 +1,0 @@\n- \t \n";
        let out = render_all(input, false);
        // the tab glyph makes the whitespace change visible
        assert!(out[2].contains('\u{2409}'));
    }

    #[test]
    fn malformed_hunk_header_is_shown_raw() {
        let input = "diff --git a/f b/f\n@@ -x,y +z @@ stuff\n";
        let out = render_all(input, false);
        assert_eq!(strip(&out[1]), "@@ -x,y +z @@ stuff");
    }

    #[test]
    fn meta_line_is_prefixed_with_the_path() {
        let input = "diff --git a/src/f.rs b/src/g.rs\nrename from src/f.rs\n";
        let out = render_all(input, false);
        assert_eq!(strip(&out[1]), "src/g.rs: rename from src/f.rs");
    }
}
