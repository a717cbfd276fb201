use std::fmt::{Display, Formatter};

/// The request methods the engine frames.
///
/// Classification is a case-sensitive prefix match of the buffered bytes
/// against the method token followed by a single space. Anything else is
/// answered with `501 Not Implemented` and never reaches a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
}

impl Method {
    const ALL: [Method; 4] = [Method::Get, Method::Head, Method::Post, Method::Put];

    /// Classifies a request by the first bytes of its request line.
    ///
    /// Returns `None` when the prefix matches none of the supported tokens.
    pub fn classify(prefix: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|method| prefix.starts_with(method.token()))
    }

    /// The method token including its trailing space, e.g. `b"GET "`.
    #[inline]
    pub const fn token(self) -> &'static [u8] {
        match self {
            Method::Get => b"GET ",
            Method::Head => b"HEAD ",
            Method::Post => b"POST ",
            Method::Put => b"PUT ",
        }
    }

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// POST and PUT carry a `Content-Length` framed body, GET and HEAD never do.
    #[inline]
    pub const fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Head => http::Method::HEAD,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(Method::classify(b"GET /"), Some(Method::Get));
        assert_eq!(Method::classify(b"HEAD /index.html"), Some(Method::Head));
        assert_eq!(Method::classify(b"POST /upload"), Some(Method::Post));
        assert_eq!(Method::classify(b"PUT /a"), Some(Method::Put));
    }

    #[test]
    fn test_classify_unsupported() {
        assert_eq!(Method::classify(b"DELETE /z"), None);
        assert_eq!(Method::classify(b"OPTIONS *"), None);

        // case-sensitive, and the space is part of the token
        assert_eq!(Method::classify(b"get /x"), None);
        assert_eq!(Method::classify(b"GETX /"), None);
        assert_eq!(Method::classify(b"PUTS /"), None);
    }

    #[test]
    fn test_has_body() {
        assert!(!Method::Get.has_body());
        assert!(!Method::Head.has_body());
        assert!(Method::Post.has_body());
        assert!(Method::Put.has_body());
    }

    #[test]
    fn test_into_http_method() {
        assert_eq!(http::Method::from(Method::Head), http::Method::HEAD);
        assert_eq!(Method::Put.to_string(), "PUT");
    }
}
