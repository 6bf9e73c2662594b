//! Generates store error enums with `impl Into` constructors.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Builds [`Self::", stringify!($variant), "`].")]
            #[must_use]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[doc = concat!("Builds [`Self::", stringify!($variant), "`].")]
            #[must_use]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($(#[$field_meta:meta])* $field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($(#[$field_meta])* $field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Exercises the generated constructors.

    define_port_error! {
        /// Error used only by these tests.
        pub enum ProbeError {
            /// Unit variant.
            Closed => "closed",
            /// Single string field.
            Rejected {
                /// Why.
                reason: String,
            } => "rejected: {reason}",
            /// Mixed fields.
            Partial {
                /// Collection name.
                collection: String,
                /// Records written before failing.
                written: u64,
            } => "partial write to {collection} after {written} records",
        }
    }

    #[test]
    fn unit_variants_get_a_constructor() {
        assert_eq!(ProbeError::closed(), ProbeError::Closed);
    }

    #[test]
    fn string_fields_accept_str() {
        assert_eq!(ProbeError::rejected("full").to_string(), "rejected: full");
    }

    #[test]
    fn non_string_fields_keep_their_type() {
        let err = ProbeError::partial("tasks", 7_u64);
        assert_eq!(err.to_string(), "partial write to tasks after 7 records");
    }
}
