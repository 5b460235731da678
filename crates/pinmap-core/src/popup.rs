// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Comment popup: the edit-once state machine and its rendering.
//!
//! A popup starts [`PopupState::Editable`] and becomes
//! [`PopupState::ViewOnly`] on the first save. `ViewOnly` has no way out, so
//! the editor can never come back once a comment has been committed.

use std::borrow::Cow;

pub const POPUP_TITLE: &str = "Comment";
pub const SAVE_LABEL: &str = "Save";
pub const NO_COMMENT_PLACEHOLDER: &str = "(no comment)";
pub const EDITOR_ROWS: usize = 3;

/// Comment state of one marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupState {
    /// Not saved yet. Holds the text area contents.
    Editable(String),
    /// Saved. Holds the committed, trimmed comment.
    ViewOnly(String),
}

impl Default for PopupState {
    fn default() -> Self {
        Self::Editable(String::new())
    }
}

impl PopupState {
    /// Commit the draft. `ViewOnly` is returned unchanged.
    #[must_use]
    pub fn save(self) -> Self {
        match self {
            Self::Editable(draft) => Self::ViewOnly(draft.trim().to_string()),
            view_only @ Self::ViewOnly(_) => view_only,
        }
    }

    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Editable(_))
    }

    /// The committed comment; empty until saved.
    #[must_use]
    pub fn comment(&self) -> &str {
        match self {
            Self::Editable(_) => "",
            Self::ViewOnly(comment) => comment,
        }
    }
}

/// Which form a marker's popup is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupForm {
    Editor,
    Viewer,
}

/// What a popup displays, ready to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupContent<'a> {
    Editor { draft: &'a str },
    Viewer { comment: &'a str },
}

impl PopupContent<'_> {
    /// Popup markup. All comment text is escaped.
    #[must_use]
    pub fn to_html(&self) -> String {
        let body = match *self {
            Self::Editor { draft } => format!(
                "<textarea class=\"commentInput\" rows=\"{EDITOR_ROWS}\">{}</textarea>\
                 <button class=\"saveBtn\" type=\"button\">{SAVE_LABEL}</button>",
                escape_html(draft)
            ),
            Self::Viewer { comment } => match visible_comment(comment) {
                Some(comment) => format!("<div>{}</div>", escape_html(comment)),
                None => format!("<div><i>{NO_COMMENT_PLACEHOLDER}</i></div>"),
            },
        };
        format!("<div class=\"popupBox\"><div class=\"popupTitle\">{POPUP_TITLE}</div>{body}</div>")
    }
}

/// The comment a viewer shows, or `None` when only the placeholder applies.
#[must_use]
pub fn visible_comment(comment: &str) -> Option<&str> {
    let comment = comment.trim();
    (!comment.is_empty()).then_some(comment)
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_trims_and_is_final() {
        let state = PopupState::Editable("  hello there \n".to_string());
        let saved = state.save();
        assert_eq!(saved, PopupState::ViewOnly("hello there".to_string()));
        assert!(!saved.is_editable());

        // Saving again changes nothing.
        assert_eq!(saved.clone().save(), saved);
    }

    #[test]
    fn test_comment_empty_until_saved() {
        let state = PopupState::Editable("draft".to_string());
        assert_eq!(state.comment(), "");
        assert_eq!(state.save().comment(), "draft");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("plain"), "plain");
        assert!(matches!(escape_html("plain"), Cow::Borrowed(_)));
        assert_eq!(
            escape_html(r#"a & b < c > d " e ' f"#),
            "a &amp; b &lt; c &gt; d &quot; e &#039; f"
        );
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_viewer_placeholder() {
        let html = PopupContent::Viewer { comment: "   " }.to_html();
        assert!(html.contains("<i>(no comment)</i>"));
    }

    #[test]
    fn test_viewer_markup() {
        assert_eq!(
            PopupContent::Viewer { comment: " hi " }.to_html(),
            "<div class=\"popupBox\"><div class=\"popupTitle\">Comment</div><div>hi</div></div>"
        );
        assert_eq!(visible_comment("  "), None);
        assert_eq!(visible_comment(" a & b "), Some("a & b"));
    }

    #[test]
    fn test_viewer_escapes_markup() {
        let html = PopupContent::Viewer {
            comment: "<img src=x onerror=alert(1)>",
        }
        .to_html();
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_editor_escapes_draft() {
        let html = PopupContent::Editor {
            draft: "</textarea><script>",
        }
        .to_html();
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;</textarea>"));
        assert!(html.contains("class=\"saveBtn\""));
        assert!(!html.contains("<script>"));
    }
}
