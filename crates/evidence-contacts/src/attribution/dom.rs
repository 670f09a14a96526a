// Copyright 2026 Evidence Contacts Contributors
// SPDX-License-Identifier: Apache-2.0

//! Immutable index over a parsed document.
//!
//! Elements are stored in document (pre-)order with parent, depth, child
//! and subtree-end indices, so every walk the attributor needs (ancestors,
//! siblings, subtree scans, LCA distance, preceding headings) is a pure
//! function over `usize` indices. A node's subtree is the contiguous range
//! `i..end(i)`.

use scraper::{ElementRef, Html, Selector};
use std::ops::Range;

#[derive(Debug, Clone)]
struct DomNode<'a> {
    el: ElementRef<'a>,
    parent: Option<usize>,
    depth: usize,
    children: Vec<usize>,
    end: usize,
}

/// Pre-order element index for one document.
pub struct DomIndex<'a> {
    nodes: Vec<DomNode<'a>>,
}

impl<'a> DomIndex<'a> {
    pub fn new(doc: &'a Html) -> Self {
        let mut nodes: Vec<DomNode<'a>> = Vec::new();
        // (element, parent index, depth)
        let mut stack: Vec<(ElementRef<'a>, Option<usize>, usize)> =
            vec![(doc.root_element(), None, 0)];

        while let Some((el, parent, depth)) = stack.pop() {
            let idx = nodes.len();
            nodes.push(DomNode {
                el,
                parent,
                depth,
                children: Vec::new(),
                end: idx + 1,
            });
            if let Some(p) = parent {
                nodes[p].children.push(idx);
            }
            let kids: Vec<ElementRef<'a>> = el.children().filter_map(ElementRef::wrap).collect();
            for kid in kids.into_iter().rev() {
                stack.push((kid, Some(idx), depth + 1));
            }
        }

        for i in (0..nodes.len()).rev() {
            let end = nodes[i]
                .children
                .iter()
                .map(|&c| nodes[c].end)
                .max()
                .unwrap_or(i + 1);
            nodes[i].end = end.max(i + 1);
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn element(&self, i: usize) -> ElementRef<'a> {
        self.nodes[i].el
    }

    pub fn parent(&self, i: usize) -> Option<usize> {
        self.nodes[i].parent
    }

    pub fn depth(&self, i: usize) -> usize {
        self.nodes[i].depth
    }

    pub fn children(&self, i: usize) -> &[usize] {
        &self.nodes[i].children
    }

    /// Indices of `i` and all its descendants.
    pub fn subtree(&self, i: usize) -> Range<usize> {
        i..self.nodes[i].end
    }

    /// True when `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: usize, node: usize) -> bool {
        self.subtree(ancestor).contains(&node)
    }

    pub fn ancestors(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.nodes[i].parent, move |&p| self.nodes[p].parent)
    }

    pub fn tag(&self, i: usize) -> &'a str {
        self.nodes[i].el.value().name()
    }

    pub fn attr(&self, i: usize, name: &str) -> Option<&'a str> {
        self.nodes[i].el.value().attr(name)
    }

    pub fn classes(&self, i: usize) -> Vec<&'a str> {
        self.nodes[i].el.value().classes().collect()
    }

    /// Collapsed descendant text.
    pub fn text(&self, i: usize) -> String {
        self.nodes[i]
            .el
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Collapsed text of `i` with the subtree of `skip` left out.
    pub fn text_excluding(&self, i: usize, skip: usize) -> String {
        if skip == i {
            return String::new();
        }
        if !self.contains(i, skip) {
            return self.text(i);
        }
        let skip_id = self.nodes[skip].el.id();
        self.nodes[i]
            .el
            .descendants()
            .filter(|n| !n.ancestors().any(|a| a.id() == skip_id))
            .filter_map(|n| n.value().as_text().map(|t| &**t))
            .collect::<Vec<&str>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All matches in document order.
    pub fn select(&self, selector: &Selector) -> Vec<usize> {
        self.select_in(0..self.nodes.len(), selector)
    }

    /// Matches inside the subtree of `root` (including `root`).
    pub fn select_within(&self, root: usize, selector: &Selector) -> Vec<usize> {
        self.select_in(self.subtree(root), selector)
    }

    fn select_in(&self, range: Range<usize>, selector: &Selector) -> Vec<usize> {
        range
            .filter(|&i| selector.matches(&self.nodes[i].el))
            .collect()
    }

    /// Edges from `a` and `b` up to their lowest common ancestor, summed.
    pub fn lca_distance(&self, a: usize, b: usize) -> usize {
        let (mut x, mut y) = (a, b);
        let mut steps = 0;
        while self.depth(x) > self.depth(y) {
            x = self.nodes[x].parent.unwrap_or(x);
            steps += 1;
        }
        while self.depth(y) > self.depth(x) {
            y = self.nodes[y].parent.unwrap_or(y);
            steps += 1;
        }
        while x != y {
            match (self.nodes[x].parent, self.nodes[y].parent) {
                (Some(px), Some(py)) => {
                    x = px;
                    y = py;
                    steps += 2;
                }
                _ => break,
            }
        }
        steps
    }

    /// Tag plus sorted class list, e.g. `div.card.team-member`.
    pub fn signature(&self, i: usize) -> String {
        let mut classes = self.classes(i);
        classes.sort_unstable();
        classes.dedup();
        let mut sig = self.tag(i).to_string();
        for c in classes {
            sig.push('.');
            sig.push_str(c);
        }
        sig
    }

    /// Number of siblings (including `i`) that share `i`'s signature.
    pub fn same_signature_siblings(&self, i: usize) -> usize {
        let Some(parent) = self.parent(i) else {
            return 1;
        };
        let sig = self.signature(i);
        self.children(parent)
            .iter()
            .filter(|&&c| self.signature(c) == sig)
            .count()
    }

    /// Up to `span` element siblings on each side of `i`, nearest first.
    pub fn close_siblings(&self, i: usize, span: usize) -> Vec<usize> {
        let Some(parent) = self.parent(i) else {
            return Vec::new();
        };
        let kids = self.children(parent);
        let Some(pos) = kids.iter().position(|&c| c == i) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for offset in 1..=span {
            if pos >= offset {
                out.push(kids[pos - offset]);
            }
            if pos + offset < kids.len() {
                out.push(kids[pos + offset]);
            }
        }
        out
    }

    /// Nearest element before `i` in document order matching `selector`,
    /// excluding `i`'s own ancestors.
    pub fn preceding_match(&self, i: usize, selector: &Selector) -> Option<usize> {
        (0..i)
            .rev()
            .filter(|&j| !self.contains(j, i))
            .find(|&j| selector.matches(&self.nodes[j].el))
    }

    /// Closest ancestor-or-self matching `selector`.
    pub fn closest(&self, i: usize, selector: &Selector) -> Option<usize> {
        std::iter::once(i)
            .chain(self.ancestors(i))
            .find(|&j| selector.matches(&self.nodes[j].el))
    }

    /// Short CSS path (up to three levels) for evidence records,
    /// e.g. `section > div.team-member:nth-of-type(2)`.
    pub fn css_path(&self, i: usize) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(i);
        while let Some(n) = cur {
            if parts.len() == 3 || matches!(self.tag(n), "html" | "body") {
                break;
            }
            parts.push(self.path_segment(n));
            cur = self.parent(n);
        }
        if parts.is_empty() {
            return self.tag(i).to_string();
        }
        parts.reverse();
        parts.join(" > ")
    }

    fn path_segment(&self, i: usize) -> String {
        let tag = self.tag(i);
        let mut seg = tag.to_string();
        if let Some(class) = self.classes(i).first() {
            seg.push('.');
            seg.push_str(class);
        }
        if let Some(parent) = self.parent(i) {
            let same_tag: Vec<usize> = self
                .children(parent)
                .iter()
                .copied()
                .filter(|&c| self.tag(c) == tag)
                .collect();
            if same_tag.len() > 1 {
                if let Some(pos) = same_tag.iter().position(|&c| c == i) {
                    seg.push_str(&format!(":nth-of-type({})", pos + 1));
                }
            }
        }
        seg
    }
}

/// Parse a selector known at compile time.
pub(crate) fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}
