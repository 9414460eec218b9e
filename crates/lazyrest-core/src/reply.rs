//! Transport-neutral request verbs and replies.

use std::fmt;

use lazyrest_store::Document;

/// Request verb as seen by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    /// Any verb the store does not implement.
    Other(String),
}

impl Method {
    /// Parse a method name. Matching is exact, as in HTTP.
    pub fn parse(name: &str) -> Self {
        match name {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response statuses the dispatcher can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Created,
    Accepted,
    BadRequest,
    NotFound,
    InternalServerError,
    NotImplemented,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::Accepted => 202,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
            Self::NotImplemented => 501,
        }
    }

    pub fn is_success(self) -> bool {
        self.code() < 300
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Reply payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Empty,
    Json(Document),
    Text(String),
}

/// Outcome of one dispatched request.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub body: Body,
}

impl Reply {
    pub fn json(status: Status, document: Document) -> Self {
        Self { status, body: Body::Json(document) }
    }

    pub fn text(status: Status, message: impl Into<String>) -> Self {
        Self { status, body: Body::Text(message.into()) }
    }

    pub fn empty(status: Status) -> Self {
        Self { status, body: Body::Empty }
    }
}
