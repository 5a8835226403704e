//! Short-code lookups for the vendor's report templates.
//!
//! Every family maps a short code (`eod`, `ann`, ...) to the vendor's wire
//! name. Parsing accepts either the code or the wire name, case-insensitively;
//! anything else is `DssError::InvalidTemplate`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::DssError;

macro_rules! code_table {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => ($code:literal, $wire:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every entry of the table, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Short code accepted by the CLI and session setters.
            #[must_use]
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Name the vendor expects on the wire.
            #[must_use]
            pub const fn wire_name(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DssError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| {
                        v.code().eq_ignore_ascii_case(key) || v.wire_name().eq_ignore_ascii_case(key)
                    })
                    .ok_or_else(|| DssError::invalid_template($kind, s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.code())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.wire_name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(d)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

code_table! {
    /// Pricing report templates.
    PricingTemplate, "pricing" {
        /// End of day pricing.
        EndOfDay => ("eod", "EndOfDayPricingExtractionRequest"),
        /// Premium end of day pricing.
        PremiumEndOfDay => ("peod", "PremiumEndOfDayPricingExtractionRequest"),
        /// Premium pricing.
        Premium => ("prem", "PremiumPricingExtractionRequest"),
    }
}

code_table! {
    /// Reference data report templates.
    ReferenceTemplate, "reference" {
        /// Terms and conditions.
        TermsAndConditions => ("tnc", "TermsAndConditionsExtractionRequest"),
        /// Bond schedules.
        BondSchedule => ("bs", "BondScheduleExtractionRequest"),
        /// Ratings.
        Ratings => ("rg", "RatingsExtractionRequest"),
        /// MBS factor history.
        MbsFactorHistory => ("mbf", "MBSFactorHistoryExtractionRequest"),
        /// Tranche factor history.
        TrancheFactorHistory => ("trf", "TrancheFactorHistoryExtractionRequest"),
        /// Fund allocation.
        FundAllocation => ("fa", "FundAllocationExtractionRequest"),
        /// Ownership.
        Ownership => ("own", "OwnershipExtractionRequest"),
        /// Symbol cross reference.
        SymbolCrossReference => ("sym", "SymbolCrossReferenceExtractionRequest"),
    }
}

code_table! {
    /// Date selecting capital change events.
    CapitalChangeType, "capital change type" {
        /// Announcement date.
        Announcement => ("ann", "CapitalChangeAnnouncementDate"),
        /// Deal date.
        Deal => ("dld", "CapitalChangeDealDate"),
        /// Ex date.
        Ex => ("exd", "CapitalChangeExDate"),
        /// Effective date.
        Effective => ("eff", "EffectiveDate"),
        /// Record date.
        Record => ("rec", "RecordDate"),
    }
}

code_table! {
    /// Date selecting dividend events.
    DividendsType, "dividends type" {
        /// Announcement date.
        Announcement => ("ann", "DividendAnnouncementDate"),
        /// Ex date.
        Ex => ("exd", "DividendExDate"),
        /// Pay date.
        Pay => ("pay", "DividendPayDate"),
        /// Record date.
        Record => ("rec", "DividendRecordDate"),
        /// Period end date.
        PeriodEnd => ("end", "PeriodEndDate"),
    }
}

code_table! {
    /// Date selecting earnings events.
    EarningsType, "earnings type" {
        /// Earnings announcement date.
        Announcement => ("ead", "EarningsAnnouncementDate"),
        /// Period end date.
        PeriodEnd => ("ped", "PeriodEndDate"),
    }
}

code_table! {
    /// Date selecting merger and acquisition events.
    MergersAcquisitionsType, "mergers and acquisitions type" {
        /// Deal announcement date.
        Announcement => ("ann", "DealAnnouncementDate"),
        /// Deal cancel date.
        Cancel => ("can", "DealCancelDate"),
        /// Deal close date.
        Close => ("cls", "DealCloseDate"),
        /// Deal effective date.
        Effective => ("eff", "DealEffectiveDate"),
        /// Revised proposal date.
        RevisedProposal => ("rev", "DealRevisedProposalDate"),
        /// Tender offer expiration date.
        TenderOfferExpiration => ("exp", "TenderOfferExpirationDate"),
    }
}

code_table! {
    /// Selection of public equity offering events.
    EquityOfferingsType, "equity offerings type" {
        /// All pending deals.
        AllPending => ("all", "AllPendingDeals"),
        /// First trading date.
        FirstTrading => ("1st", "FirstTradingDate"),
    }
}

code_table! {
    /// Report template family, used to look up valid content field names.
    ReportTemplateType, "report template type" {
        /// Standard corporate actions.
        CorporateActions => ("CorporateActions", "CorporateActions"),
        /// Composite.
        Composite => ("Composite", "Composite"),
        /// End of day pricing.
        EndOfDayPricing => ("EndOfDayPricing", "EndOfDayPricing"),
        /// Premium end of day pricing.
        PremiumEndOfDayPricing => ("PremiumEndOfDayPricing", "PremiumEndOfDayPricing"),
        /// Premium pricing.
        PremiumPricing => ("PremiumPricing", "PremiumPricing"),
        /// Intraday pricing.
        IntradayPricing => ("IntradayPricing", "IntradayPricing"),
        /// Price history.
        PriceHistory => ("PriceHistory", "PriceHistory"),
        /// Single historical price.
        SingleHistoricalPrice => ("SingleHistoricalPrice", "SingleHistoricalPrice"),
        /// Terms and conditions.
        TermsAndConditions => ("TermsAndConditions", "TermsAndConditions"),
        /// Bond schedules.
        BondSchedule => ("BondSchedule", "BondSchedule"),
        /// Ratings.
        Ratings => ("Ratings", "Ratings"),
        /// MBS factor history.
        MbsFactorHistory => ("MBSFactorHistory", "MBSFactorHistory"),
        /// Tranche factor history.
        TrancheFactorHistory => ("TrancheFactorHistory", "TrancheFactorHistory"),
        /// Fund allocation.
        FundAllocation => ("FundAllocation", "FundAllocation"),
        /// Ownership.
        Ownership => ("Ownership", "Ownership"),
        /// Symbol cross reference.
        SymbolCrossReference => ("SymbolCrossReference", "SymbolCrossReference"),
        /// Historical reference.
        HistoricalReference => ("HistoricalReference", "HistoricalReference"),
    }
}

impl PricingTemplate {
    /// Template family used for field-name lookups.
    #[must_use]
    pub const fn report_template_type(self) -> ReportTemplateType {
        match self {
            Self::EndOfDay => ReportTemplateType::EndOfDayPricing,
            Self::PremiumEndOfDay => ReportTemplateType::PremiumEndOfDayPricing,
            Self::Premium => ReportTemplateType::PremiumPricing,
        }
    }
}

impl ReferenceTemplate {
    /// Template family used for field-name lookups.
    #[must_use]
    pub const fn report_template_type(self) -> ReportTemplateType {
        match self {
            Self::TermsAndConditions => ReportTemplateType::TermsAndConditions,
            Self::BondSchedule => ReportTemplateType::BondSchedule,
            Self::Ratings => ReportTemplateType::Ratings,
            Self::MbsFactorHistory => ReportTemplateType::MbsFactorHistory,
            Self::TrancheFactorHistory => ReportTemplateType::TrancheFactorHistory,
            Self::FundAllocation => ReportTemplateType::FundAllocation,
            Self::Ownership => ReportTemplateType::Ownership,
            Self::SymbolCrossReference => ReportTemplateType::SymbolCrossReference,
        }
    }
}

impl ReportTemplateType {
    /// Name of the extraction request type serving this family.
    #[must_use]
    pub const fn request_type(self) -> &'static str {
        match self {
            Self::CorporateActions => "CorporateActionsStandardExtractionRequest",
            Self::Composite => "CompositeExtractionRequest",
            Self::EndOfDayPricing => "EndOfDayPricingExtractionRequest",
            Self::PremiumEndOfDayPricing => "PremiumEndOfDayPricingExtractionRequest",
            Self::PremiumPricing => "PremiumPricingExtractionRequest",
            Self::IntradayPricing => "IntradayPricingExtractionRequest",
            Self::PriceHistory => "PriceHistoryExtractionRequest",
            Self::SingleHistoricalPrice => "SingleHistoricalPriceExtractionRequest",
            Self::TermsAndConditions => "TermsAndConditionsExtractionRequest",
            Self::BondSchedule => "BondScheduleExtractionRequest",
            Self::Ratings => "RatingsExtractionRequest",
            Self::MbsFactorHistory => "MBSFactorHistoryExtractionRequest",
            Self::TrancheFactorHistory => "TrancheFactorHistoryExtractionRequest",
            Self::FundAllocation => "FundAllocationExtractionRequest",
            Self::Ownership => "OwnershipExtractionRequest",
            Self::SymbolCrossReference => "SymbolCrossReferenceExtractionRequest",
            Self::HistoricalReference => "HistoricalReferenceExtractionRequest",
        }
    }

    /// Reverse of [`ReportTemplateType::request_type`].
    ///
    /// Accepts the bare request type name or the full `@odata.type` value.
    #[must_use]
    pub fn from_request_type(odata_type: &str) -> Option<Self> {
        let name = odata_type.rsplit('.').next().unwrap_or(odata_type);
        Self::ALL.iter().copied().find(|t| t.request_type() == name)
    }

    /// The `ReportTemplateType` argument of the field-name lookup endpoint.
    #[must_use]
    pub fn qualified_name(self) -> String {
        format!(
            "ThomsonReuters.Dss.Api.Extractions.ReportTemplates.ReportTemplateTypes'{}'",
            self.wire_name()
        )
    }
}
