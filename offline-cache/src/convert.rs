//! Convenient conversion traits.
//
// Methods on `Request` and `Response` take `impl ToHeaderName` and friends rather than the concrete
// `http` types, so callers can pass string literals without explicit conversions. A failed
// conversion of a string literal panics; typed values never do. Untrusted input should be parsed
// explicitly with `TryFrom`/`FromStr` before it reaches these methods.
//
// The traits are sealed so that they cannot be implemented outside this crate.
#[macro_use]
mod macros;

use ::url::Url;
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};

pub use self::header_name::ToHeaderName;
pub use self::header_value::ToHeaderValue;
pub use self::method::ToMethod;
pub use self::status_code::ToStatusCode;
pub use self::url::ToUrl;

mod header_name {
    use super::*;

    /// Types that can be converted to a [`HeaderName`].
    ///
    /// | Source type                                         | Can panic? |
    /// |-----------------------------------------------------|------------|
    /// | [`HeaderName` or `&HeaderName`][`HeaderName`]       | No         |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        |
    /// | [`&[u8]`][`std::slice`] or [`Vec<u8>`][`Vec`]       | Yes        |
    pub trait ToHeaderName: Sealed {}

    convert_stringy!(
        @with_byte_impls,
        HeaderName,
        ToHeaderName,
        Sealed,
        "invalid HTTP header name"
    );
}

mod header_value {
    use super::*;

    /// Types that can be converted to a [`HeaderValue`].
    ///
    /// | Source type                                         | Can panic? |
    /// |-----------------------------------------------------|------------|
    /// | [`HeaderValue` or `&HeaderValue`][`HeaderValue`]    | No         |
    /// | [`HeaderName`]                                      | No         |
    /// | [`Url` or `&Url`][`Url`]                            | No         |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        |
    /// | [`&[u8]`][`std::slice`] or [`Vec<u8>`][`Vec`]       | Yes        |
    pub trait ToHeaderValue: Sealed {}

    convert_stringy!(
        @with_byte_impls,
        HeaderValue,
        ToHeaderValue,
        Sealed,
        "invalid HTTP header value"
    );

    impl ToHeaderValue for HeaderName {}
    impl ToHeaderValue for Url {}
    impl ToHeaderValue for &Url {}
    impl ToHeaderValue for mime::Mime {}

    impl Sealed for HeaderName {
        fn into_owned(self) -> HeaderValue {
            HeaderValue::from(self)
        }
    }

    impl Sealed for Url {
        fn into_owned(self) -> HeaderValue {
            Sealed::into_owned(self.as_str())
        }
    }

    impl Sealed for &Url {
        fn into_owned(self) -> HeaderValue {
            Sealed::into_owned(self.as_str())
        }
    }

    impl Sealed for mime::Mime {
        fn into_owned(self) -> HeaderValue {
            Sealed::into_owned(self.to_string())
        }
    }
}

mod method {
    use super::*;

    /// Types that can be converted to a [`Method`].
    ///
    /// | Source type                                         | Can panic? |
    /// |-----------------------------------------------------|------------|
    /// | [`Method` or `&Method`][`Method`]                   | No         |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        |
    /// | [`&[u8]`][`std::slice`] or [`Vec<u8>`][`Vec`]       | Yes        |
    pub trait ToMethod: Sealed {}

    convert_stringy!(@with_byte_impls, Method, ToMethod, Sealed, "invalid HTTP method");
}

mod url {
    use super::*;

    /// Types that can be converted to a [`Url`].
    ///
    /// Only absolute URLs can be converted; relative paths must be joined against a base first.
    ///
    /// | Source type                                         | Can panic? |
    /// |-----------------------------------------------------|------------|
    /// | [`Url` or `&Url`][`Url`]                            | No         |
    /// | [`&str`][`str`], [`String`, or `&String`][`String`] | Yes        |
    pub trait ToUrl: Sealed {}

    convert_stringy!(Url, ToUrl, Sealed, "invalid URL");
}

mod status_code {
    use super::*;

    /// Types that can be converted to a [`StatusCode`].
    ///
    /// | Source type    | Can panic? |
    /// |----------------|------------|
    /// | [`StatusCode`] | No         |
    /// | [`u16`]        | Yes        |
    pub trait ToStatusCode: Sealed {}

    impl ToStatusCode for StatusCode {}

    impl ToStatusCode for u16 {}

    pub trait Sealed {
        fn to_status_code(self) -> StatusCode;
    }

    impl Sealed for StatusCode {
        fn to_status_code(self) -> StatusCode {
            self
        }
    }

    impl Sealed for u16 {
        fn to_status_code(self) -> StatusCode {
            StatusCode::from_u16(self)
                .unwrap_or_else(|_| panic!("invalid HTTP status code: {}", self))
        }
    }
}
