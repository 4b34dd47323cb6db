use std::{collections::BTreeMap, fmt::Display};

use crate::{
    model::{Author, Comment},
    store::CommentStore,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub const ALL: [SortOrder; 2] = [SortOrder::Newest, SortOrder::Oldest];

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest First",
            SortOrder::Oldest => "Oldest First",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortOrder::Newest => "Newest",
            SortOrder::Oldest => "Oldest",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionFilter {
    #[default]
    All,
    Open,
    Resolved,
}

impl ResolutionFilter {
    pub const ALL: [ResolutionFilter; 3] = [
        ResolutionFilter::All,
        ResolutionFilter::Open,
        ResolutionFilter::Resolved,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResolutionFilter::All => "All Comments",
            ResolutionFilter::Open => "Unresolved",
            ResolutionFilter::Resolved => "Resolved",
        }
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        match self {
            ResolutionFilter::All => true,
            ResolutionFilter::Open => !comment.resolved,
            ResolutionFilter::Resolved => comment.resolved,
        }
    }
}

impl Display for ResolutionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionFilter::All => "All",
            ResolutionFilter::Open => "Unresolved",
            ResolutionFilter::Resolved => "Resolved",
        };
        write!(f, "{s}")
    }
}

/// Filters and ordering for the top-level list of a panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopLevelQuery {
    pub author: Option<String>,
    pub resolution: ResolutionFilter,
    pub sort: SortOrder,
}

impl TopLevelQuery {
    pub fn is_filtered(&self) -> bool {
        self.author.is_some() || self.resolution != ResolutionFilter::All
    }
}

impl CommentStore {
    /// Top-level comments matching `query`, in the requested order.
    ///
    /// The pinned comment never appears here, whatever the filters; it is shown on its own via
    /// [`CommentStore::pinned`]. Ties on the creation time are broken by id so that the two sort
    /// orders are exact mirrors of each other.
    pub fn top_level_view(&self, query: &TopLevelQuery) -> Vec<&Comment> {
        let mut view: Vec<&Comment> = self
            .comments()
            .iter()
            .filter(|c| c.is_top_level() && !c.is_pinned)
            .filter(|c| {
                query
                    .author
                    .as_deref()
                    .is_none_or(|name| c.author.name == name)
            })
            .filter(|c| query.resolution.matches(c))
            .collect();
        view.sort_by_key(|c| (c.created_at, c.id));
        if query.sort == SortOrder::Newest {
            view.reverse();
        }
        view
    }

    /// Every distinct author, sorted by name.
    pub fn authors(&self) -> Vec<&Author> {
        let by_name: BTreeMap<&str, &Author> = self
            .comments()
            .iter()
            .map(|c| (c.author.name.as_str(), &c.author))
            .collect();
        by_name.into_values().collect()
    }

    /// Authors that can be `@`-mentioned by `current_user`, sorted by name.
    pub fn mentionable_users(&self, current_user: &str) -> Vec<&Author> {
        self.authors()
            .into_iter()
            .filter(|a| a.name != current_user)
            .collect()
    }
}
