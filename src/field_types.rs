//! Field type taxonomy shared by every component of the engine.
//!
//! Types come from two predictors: the upstream markup heuristics and the
//! classification server. The effective type of a field is the server
//! prediction when one exists, otherwise the heuristic one. Components never
//! look at raw control markup; they branch on `FieldType` and its group.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Semantic type of a single form field.
///
/// `Unknown` means no predictor recognized the field. `Empty` never appears
/// as a prediction; it only occurs in possible-type sets for fields the user
/// left blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Unknown,
    Empty,
    NameFirst,
    NameMiddle,
    NameLast,
    NameFull,
    EmailAddress,
    CompanyName,
    AddressHomeLine1,
    AddressHomeLine2,
    AddressHomeCity,
    AddressHomeState,
    AddressHomeZip,
    AddressHomeCountry,
    AddressBillingLine1,
    AddressBillingLine2,
    AddressBillingCity,
    AddressBillingState,
    AddressBillingZip,
    AddressBillingCountry,
    PhoneHomeCityCode,
    PhoneHomeNumber,
    PhoneHomeWholeNumber,
    PhoneFaxCityCode,
    PhoneFaxNumber,
    PhoneFaxWholeNumber,
    CreditCardName,
    CreditCardNumber,
    CreditCardExpMonth,
    CreditCardExp2DigitYear,
    CreditCardExp4DigitYear,
    CreditCardType,
    CreditCardVerificationCode,
}

/// Coarse grouping used for section appropriateness and fill gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTypeGroup {
    Identity,
    Phone,
    Fax,
    Payment,
    Unknown,
}

/// Set of field types, as produced by possible-type determination.
pub type FieldTypeSet = HashSet<FieldType>;

impl FieldType {
    /// The group this type belongs to.
    pub fn group(self) -> FieldTypeGroup {
        use FieldType::*;
        match self {
            NameFirst | NameMiddle | NameLast | NameFull | EmailAddress | CompanyName
            | AddressHomeLine1 | AddressHomeLine2 | AddressHomeCity | AddressHomeState
            | AddressHomeZip | AddressHomeCountry | AddressBillingLine1 | AddressBillingLine2
            | AddressBillingCity | AddressBillingState | AddressBillingZip
            | AddressBillingCountry => FieldTypeGroup::Identity,
            PhoneHomeCityCode | PhoneHomeNumber | PhoneHomeWholeNumber => FieldTypeGroup::Phone,
            PhoneFaxCityCode | PhoneFaxNumber | PhoneFaxWholeNumber => FieldTypeGroup::Fax,
            CreditCardName | CreditCardNumber | CreditCardExpMonth | CreditCardExp2DigitYear
            | CreditCardExp4DigitYear | CreditCardType | CreditCardVerificationCode => {
                FieldTypeGroup::Payment
            }
            Unknown | Empty => FieldTypeGroup::Unknown,
        }
    }

    /// Collapses billing address variants onto their home counterparts.
    ///
    /// Section boundary detection keys its seen-set on equivalent types, so
    /// a shipping block followed by a billing block counts as a repeat and
    /// splits into two sections.
    pub fn equivalent(self) -> FieldType {
        use FieldType::*;
        match self {
            AddressBillingLine1 => AddressHomeLine1,
            AddressBillingLine2 => AddressHomeLine2,
            AddressBillingCity => AddressHomeCity,
            AddressBillingState => AddressHomeState,
            AddressBillingZip => AddressHomeZip,
            AddressBillingCountry => AddressHomeCountry,
            other => other,
        }
    }

    /// True for the seven-digit local phone/fax number types, the only ones
    /// subject to the prefix/suffix split on filling.
    pub fn is_phone_number_part(self) -> bool {
        matches!(self, FieldType::PhoneHomeNumber | FieldType::PhoneFaxNumber)
    }
}
