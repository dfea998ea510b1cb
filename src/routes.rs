//! Route strings shown in the header and accepted by `kb open`.
//!
//! Routes mirror the paths of the web client (`/knowledge/:id`,
//! `/search?q=..&page=..`) so a copied route reproduces the same screen.
//! Search pages are one-based in the route and zero-based everywhere else.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    SignIn,
    SignUp,
    KnowledgeList { tag: Option<String> },
    KnowledgeCreate,
    KnowledgeView(String),
    KnowledgeEdit(String),
    Sources,
    SourceCreate,
    SourceView(String),
    SourceEdit(String),
    Search { query: Option<String>, page: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown route: {0}")]
pub struct RouteError(pub String);

impl Route {
    pub fn knowledge() -> Self {
        Route::KnowledgeList { tag: None }
    }

    pub fn search(query: impl Into<String>, page: u32) -> Self {
        Route::Search {
            query: Some(query.into()),
            page,
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::SignIn | Route::SignUp)
    }

    /// Where an anonymous or signed-in user actually lands when asking for `self`.
    pub fn guard(self, authenticated: bool) -> Route {
        match (self.requires_auth(), authenticated) {
            (true, false) => Route::SignIn,
            (false, true) => Route::Dashboard,
            (_, _) => self,
        }
    }

    /// Target of the back action.
    pub fn parent(&self) -> Option<Route> {
        match self {
            Route::Dashboard | Route::SignIn => None,
            Route::SignUp => Some(Route::SignIn),
            Route::KnowledgeList { tag: Some(_) } => Some(Route::knowledge()),
            Route::KnowledgeList { tag: None } | Route::Sources | Route::Search { .. } => {
                Some(Route::Dashboard)
            }
            Route::KnowledgeCreate | Route::KnowledgeView(_) => Some(Route::knowledge()),
            Route::KnowledgeEdit(id) => Some(Route::KnowledgeView(id.clone())),
            Route::SourceCreate | Route::SourceView(_) => Some(Route::Sources),
            Route::SourceEdit(id) => Some(Route::SourceView(id.clone())),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::SignIn => "Sign In",
            Route::SignUp => "Sign Up",
            Route::KnowledgeList { .. } => "Knowledge Base",
            Route::KnowledgeCreate => "Create Knowledge Item",
            Route::KnowledgeView(_) => "Knowledge Item",
            Route::KnowledgeEdit(_) => "Edit Knowledge Item",
            Route::Sources => "Knowledge Sources",
            Route::SourceCreate => "Add Knowledge Source",
            Route::SourceView(_) => "Knowledge Source",
            Route::SourceEdit(_) => "Edit Knowledge Source",
            Route::Search { .. } => "Search",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Dashboard => write!(f, "/"),
            Route::SignIn => write!(f, "/auth/signin"),
            Route::SignUp => write!(f, "/auth/signup"),
            Route::KnowledgeList { tag: None } => write!(f, "/knowledge"),
            Route::KnowledgeList { tag: Some(tag) } => {
                write!(f, "/knowledge?tag={}", urlencoding::encode(tag))
            }
            Route::KnowledgeCreate => write!(f, "/knowledge/create"),
            Route::KnowledgeView(id) => write!(f, "/knowledge/{}", urlencoding::encode(id)),
            Route::KnowledgeEdit(id) => write!(f, "/knowledge/{}/edit", urlencoding::encode(id)),
            Route::Sources => write!(f, "/sources"),
            Route::SourceCreate => write!(f, "/sources/create"),
            Route::SourceView(id) => write!(f, "/sources/{}", urlencoding::encode(id)),
            Route::SourceEdit(id) => write!(f, "/sources/{}/edit", urlencoding::encode(id)),
            Route::Search { query: None, .. } => write!(f, "/search"),
            Route::Search {
                query: Some(query),
                page,
            } => {
                write!(f, "/search?q={}", urlencoding::encode(query))?;
                if *page > 0 {
                    write!(f, "&page={}", page + 1)?;
                }
                Ok(())
            }
        }
    }
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        (k == key).then(|| decode(v))
    })
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (path, query) = trimmed.split_once('?').unwrap_or((trimmed, ""));
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode)
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let route = match segments.as_slice() {
            [] | ["dashboard"] => Route::Dashboard,
            ["auth", "signin"] => Route::SignIn,
            ["auth", "signup"] => Route::SignUp,
            ["knowledge"] => Route::KnowledgeList {
                tag: query_param(query, "tag").filter(|t| !t.trim().is_empty()),
            },
            ["knowledge", "create"] => Route::KnowledgeCreate,
            ["knowledge", id] => Route::KnowledgeView(id.to_string()),
            ["knowledge", id, "edit"] => Route::KnowledgeEdit(id.to_string()),
            ["sources"] => Route::Sources,
            ["sources", "create"] => Route::SourceCreate,
            ["sources", id] => Route::SourceView(id.to_string()),
            ["sources", id, "edit"] => Route::SourceEdit(id.to_string()),
            ["search"] | ["search", "results"] => {
                let query_text = query_param(query, "q").filter(|q| !q.trim().is_empty());
                let page = query_param(query, "page")
                    .and_then(|p| p.parse::<u32>().ok())
                    .map(|p| p.saturating_sub(1))
                    .unwrap_or(0);
                Route::Search {
                    page: if query_text.is_some() { page } else { 0 },
                    query: query_text,
                }
            }
            _ => return Err(RouteError(raw.to_string())),
        };
        Ok(route)
    }
}
