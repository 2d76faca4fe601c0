//! Macros to support the implementation of conversion traits.

/// Implements a sealed conversion trait for a string-like target type.
///
/// The arguments are:
///
/// - `@with_byte_impls`: optional, generates byte slice and vector impls. Must come first.
///
/// - `$type`: the target type of the conversion, for example `HeaderName`.
///
/// - `$trait`: the user-facing marker trait, declared by the caller so it can carry its own docs.
///
/// - `$sealed`: the supertrait holding the conversion method. It is defined by this macro.
///
/// - `$fail_msg`: the panic message used when a string or byte conversion fails.
macro_rules! convert_stringy {
    ( $type:path, $trait:ident, $sealed:ident, $fail_msg:literal ) => {
        #[allow(unused)]
        use std::str::FromStr;

        impl $trait for $type {}
        impl<'a> $trait for &'a $type {}
        impl $trait for &str {}
        impl $trait for String {}
        impl $trait for &String {}

        pub trait $sealed {
            fn into_owned(self) -> $type;
        }

        impl $sealed for $type {
            fn into_owned(self) -> $type {
                self
            }
        }

        impl<'a> $sealed for &'a $type {
            fn into_owned(self) -> $type {
                self.clone()
            }
        }

        impl $sealed for &str {
            fn into_owned(self) -> $type {
                <$type>::from_str(self).unwrap_or_else(|_| panic!(concat!($fail_msg, ": {}"), self))
            }
        }

        impl $sealed for String {
            fn into_owned(self) -> $type {
                $sealed::into_owned(self.as_str())
            }
        }

        impl $sealed for &String {
            fn into_owned(self) -> $type {
                $sealed::into_owned(self.as_str())
            }
        }
    };
    ( @with_byte_impls, $type:path, $trait:ident, $sealed:ident, $fail_msg:literal ) => {
        convert_stringy!($type, $trait, $sealed, $fail_msg);

        impl $trait for &[u8] {}
        impl $trait for Vec<u8> {}

        impl $sealed for &[u8] {
            fn into_owned(self) -> $type {
                <$type>::try_from(self).unwrap_or_else(|_| panic!(concat!($fail_msg, ": {:?}"), self))
            }
        }

        impl $sealed for Vec<u8> {
            fn into_owned(self) -> $type {
                $sealed::into_owned(self.as_slice())
            }
        }
    };
}
