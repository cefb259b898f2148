//! Common utilities for the Sage Pay connector workspace

pub mod consts;
pub mod crypto;
pub mod errors;
pub mod ext_traits;
pub mod pii;
pub mod request;
pub mod types;

pub use errors::{CustomResult, ParsingError, ValidationError};
pub use hyperswitch_masking::{
    ExposeInterface, ExposeOptionInterface, Mask, Maskable, PeekInterface, Secret, Strategy,
    WithType,
};
pub use pii::{Email, SecretSerdeValue};
pub use request::{Method, Request, RequestContent};
pub use types::{
    AmountConvertor, MinorUnit, MinorUnitForConnector, StringMajorUnit,
    StringMajorUnitForConnector,
};
