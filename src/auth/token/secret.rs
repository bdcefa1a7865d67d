//! Redacting wrappers for token material and the derived `Authorization` header.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Value of the `Authorization` header, e.g. `Bearer eyJ...`.
///
/// Always derived from the session's current access token; never cached on its own.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationHeader(String);
impl AuthorizationHeader {
	/// Wraps a preformatted header value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Builds `"{token_type} {access_token}"`; empty or any-case `bearer` types render as `Bearer`.
	pub fn from_token(token_type: &str, access_token: &TokenSecret) -> Self {
		let scheme = if token_type.is_empty() || token_type.eq_ignore_ascii_case("bearer") {
			"Bearer"
		} else {
			token_type
		};

		Self(format!("{scheme} {}", access_token.expose()))
	}

	/// Returns the header value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for AuthorizationHeader {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AuthorizationHeader").field(&"<redacted>").finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn header_uses_token_type_and_defaults_to_bearer() {
		let secret = TokenSecret::new("abc");

		assert_eq!(AuthorizationHeader::from_token("Bearer", &secret).expose(), "Bearer abc");
		assert_eq!(AuthorizationHeader::from_token("", &secret).expose(), "Bearer abc");
		assert_eq!(AuthorizationHeader::from_token("bearer", &secret).expose(), "Bearer abc");
		assert_eq!(AuthorizationHeader::from_token("MAC", &secret).expose(), "MAC abc");
		assert_eq!(
			format!("{:?}", AuthorizationHeader::from_token("Bearer", &secret)),
			"AuthorizationHeader(\"<redacted>\")"
		);
	}
}
