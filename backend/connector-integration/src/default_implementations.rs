//! Default implementations for the redirect verification traits
//!
//! Only the Form integration signs its redirect (the encrypted `crypt` field), so the other
//! connectors get the no-op `SourceVerification` and `BodyDecoding` impls generated here.
//! Form implements both in `sagepayform.rs`.

use interfaces::{decode::BodyDecoding, verification::SourceVerification};

use crate::connectors::{Sagepaydirect, Sagepaypi, Sagepayserver};

macro_rules! default_impl_redirect_verification {
    ($($connector:ident),*) => {
        $(
            impl SourceVerification for $connector {}

            impl BodyDecoding for $connector {}
        )*
    };
}

default_impl_redirect_verification!(Sagepaydirect, Sagepayserver, Sagepaypi);
