use crate::aggregate::Snapshot;
use crate::models::{ContentItem, ContentKind};

/// Which collections a search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchScopes {
    pub thoughts: bool,
    pub articles: bool,
    pub gallery: bool,
}

impl SearchScopes {
    pub fn all() -> Self {
        Self {
            thoughts: true,
            articles: true,
            gallery: true,
        }
    }

    pub fn none() -> Self {
        Self {
            thoughts: false,
            articles: false,
            gallery: false,
        }
    }

    /// Scopes from a list of kinds; an empty list means everything.
    pub fn from_kinds(kinds: &[ContentKind]) -> Self {
        if kinds.is_empty() {
            return Self::all();
        }
        Self {
            thoughts: kinds.contains(&ContentKind::Thoughts),
            articles: kinds.contains(&ContentKind::Articles),
            gallery: kinds.contains(&ContentKind::Gallery),
        }
    }

    pub fn contains(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Thoughts => self.thoughts,
            ContentKind::Articles => self.articles,
            ContentKind::Gallery => self.gallery,
        }
    }
}

impl Default for SearchScopes {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Plain(String),
    Match(String),
}

/// Text split into plain runs and keyword occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Highlighted {
    pub fragments: Vec<Fragment>,
}

impl Highlighted {
    pub fn match_count(&self) -> usize {
        self.fragments
            .iter()
            .filter(|f| matches!(f, Fragment::Match(_)))
            .count()
    }

    /// Reassembles the text with every occurrence wrapped in `open`/`close`.
    pub fn wrap(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Plain(text) => out.push_str(text),
                Fragment::Match(text) => {
                    out.push_str(open);
                    out.push_str(text);
                    out.push_str(close);
                }
            }
        }
        out
    }

    pub fn plain_text(&self) -> String {
        self.wrap("", "")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub kind: ContentKind,
    pub label: &'static str,
    pub item: ContentItem,
    pub title: Option<Highlighted>,
    pub snippet: Highlighted,
}

/// A lowercased keyword ready for matching.
#[derive(Debug, Clone)]
struct Needle(Vec<char>);

impl Needle {
    fn new(keyword: &str) -> Option<Self> {
        let chars: Vec<char> = keyword.trim().chars().flat_map(char::to_lowercase).collect();
        (!chars.is_empty()).then_some(Needle(chars))
    }

    /// Length in bytes of the match at the start of `rest`, if any.
    fn match_len(&self, rest: &str) -> Option<usize> {
        let mut matched = 0;
        for (offset, ch) in rest.char_indices() {
            if matched == self.0.len() {
                return Some(offset);
            }
            for lower in ch.to_lowercase() {
                if self.0.get(matched) != Some(&lower) {
                    return None;
                }
                matched += 1;
            }
        }
        (matched == self.0.len()).then_some(rest.len())
    }

    fn find(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        let mut start = from;
        while start < text.len() {
            if let Some(len) = self.match_len(&text[start..]) {
                return Some((start, start + len));
            }
            start += text[start..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }

    fn is_in(&self, text: &str) -> bool {
        self.find(text, 0).is_some()
    }

    fn highlight(&self, text: &str) -> Highlighted {
        let mut fragments = Vec::new();
        let mut last = 0;
        while let Some((start, end)) = self.find(text, last) {
            if start > last {
                fragments.push(Fragment::Plain(text[last..start].to_string()));
            }
            fragments.push(Fragment::Match(text[start..end].to_string()));
            last = end;
        }
        if last < text.len() {
            fragments.push(Fragment::Plain(text[last..].to_string()));
        }
        Highlighted { fragments }
    }
}

/// Case-insensitive literal substring test. A blank keyword matches nothing.
pub fn contains_ignore_case(text: &str, keyword: &str) -> bool {
    Needle::new(keyword).is_some_and(|needle| needle.is_in(text))
}

/// Splits `text` around every case-insensitive occurrence of `keyword`.
pub fn highlight(text: &str, keyword: &str) -> Highlighted {
    match Needle::new(keyword) {
        Some(needle) => needle.highlight(text),
        None => Highlighted {
            fragments: vec![Fragment::Plain(text.to_string())],
        },
    }
}

/// Finds items in the snapshot whose text contains `keyword`, thoughts
/// first, then articles, then albums, each in snapshot order.
pub fn search(snapshot: &Snapshot, keyword: &str, scopes: SearchScopes) -> Vec<SearchHit> {
    let Some(needle) = Needle::new(keyword) else {
        return Vec::new();
    };
    let mut hits = Vec::new();

    if scopes.thoughts {
        for post in &snapshot.thoughts {
            if needle.is_in(&post.content) {
                hits.push(SearchHit {
                    kind: ContentKind::Thoughts,
                    label: ContentKind::Thoughts.label(),
                    item: post.clone().into(),
                    title: None,
                    snippet: needle.highlight(&post.content),
                });
            }
        }
    }

    if scopes.articles {
        for post in &snapshot.articles {
            if needle.is_in(&post.title) || needle.is_in(&post.content) {
                hits.push(SearchHit {
                    kind: ContentKind::Articles,
                    label: ContentKind::Articles.label(),
                    item: post.clone().into(),
                    title: Some(needle.highlight(&post.title)),
                    snippet: needle.highlight(&post.content),
                });
            }
        }
    }

    if scopes.gallery {
        for album in &snapshot.albums {
            let Some(description) = album.description.as_deref() else {
                continue;
            };
            if needle.is_in(description) {
                hits.push(SearchHit {
                    kind: ContentKind::Gallery,
                    label: ContentKind::Gallery.label(),
                    item: album.clone().into(),
                    title: None,
                    snippet: needle.highlight(description),
                });
            }
        }
    }

    hits
}
