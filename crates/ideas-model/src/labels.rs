//! Closed label sets.
//!
//! Each enum serializes as its human-facing label (the same string the web
//! frontend shows), and parses back from that label case-insensitively.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| UnknownLabel {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

// ============================================================================
// Idea labels
// ============================================================================

labelled_enum! {
    /// Business category of an idea.
    Category {
        Technology => "Technology",
        Healthcare => "Healthcare",
        Education => "Education",
        Finance => "Finance",
        ECommerce => "E-commerce",
        FoodAndBeverage => "Food & Beverage",
        TravelAndTourism => "Travel & Tourism",
        RealEstate => "Real Estate",
        Entertainment => "Entertainment",
        Fashion => "Fashion",
        Sports => "Sports",
        Automotive => "Automotive",
        Agriculture => "Agriculture",
        Energy => "Energy",
        Manufacturing => "Manufacturing",
        Other => "Other",
    }
}

labelled_enum! {
    /// Capital needed to start, in ascending order.
    InvestmentRange {
        UnderOneLakh => "Under ₹1 Lakh",
        OneToFiveLakhs => "₹1-5 Lakhs",
        FiveToTenLakhs => "₹5-10 Lakhs",
        TenToTwentyFiveLakhs => "₹10-25 Lakhs",
        TwentyFiveToFiftyLakhs => "₹25-50 Lakhs",
        FiftyLakhsToOneCrore => "₹50 Lakhs - 1 Crore",
        AboveOneCrore => "Above ₹1 Crore",
    }
}

labelled_enum! {
    /// Time until the business can start operating, in ascending order.
    TimeToStart {
        Immediately => "Immediately",
        OneToThreeMonths => "1-3 months",
        ThreeToSixMonths => "3-6 months",
        SixToTwelveMonths => "6-12 months",
        OneToTwoYears => "1-2 years",
        MoreThanTwoYears => "More than 2 years",
    }
}

labelled_enum! {
    BusinessModel {
        B2B => "B2B",
        B2C => "B2C",
        B2B2C => "B2B2C",
        C2C => "C2C",
        Subscription => "Subscription",
        Marketplace => "Marketplace",
        Freemium => "Freemium",
        Other => "Other",
    }
}

labelled_enum! {
    /// Geographic scope of the addressable market, narrowest first.
    MarketSize {
        Local => "Local (City/Town)",
        Regional => "Regional (State)",
        National => "National",
        International => "International",
        Global => "Global",
    }
}

labelled_enum! {
    IdeaStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
}

impl Default for IdeaStatus {
    fn default() -> Self {
        IdeaStatus::Published
    }
}

labelled_enum! {
    ReviewStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl Default for ReviewStatus {
    fn default() -> Self {
        ReviewStatus::Pending
    }
}

// ============================================================================
// User labels
// ============================================================================

labelled_enum! {
    Role {
        User => "user",
        Admin => "admin",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

labelled_enum! {
    AgeBracket {
        Under18 => "Under 18",
        From18To25 => "18-25",
        From26To35 => "26-35",
        From36To45 => "36-45",
        From46To60 => "46-60",
        Above60 => "Above 60",
    }
}

labelled_enum! {
    /// Annual income, in lakhs per annum.
    IncomeBracket {
        Below3Lpa => "Below 3 LPA",
        From3To6Lpa => "3-6 LPA",
        From6To10Lpa => "6-10 LPA",
        From10To20Lpa => "10-20 LPA",
        Above20Lpa => "Above 20 LPA",
    }
}

labelled_enum! {
    Gender {
        Male => "Male",
        Female => "Female",
        Other => "Other",
        PreferNotToSay => "Prefer not to say",
    }
}

labelled_enum! {
    Caste {
        General => "General",
        Obc => "OBC",
        Sc => "SC",
        St => "ST",
        Other => "Other",
    }
}

labelled_enum! {
    Area {
        Urban => "Urban",
        SemiUrban => "Semi-Urban",
        Rural => "Rural",
    }
}
