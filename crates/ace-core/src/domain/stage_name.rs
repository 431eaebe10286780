//! The closed set of pipeline roles.

use serde::{Deserialize, Serialize};

/// One of the three canonical pipeline roles.
///
/// Doubles as the child identity used for ordering and as the `Context` key.
/// Variant order is the canonical execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageName {
    Generator,
    Reflector,
    Curator,
}

impl StageName {
    /// All roles in canonical execution order.
    pub const CANONICAL_ORDER: [StageName; 3] =
        [StageName::Generator, StageName::Reflector, StageName::Curator];

    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Generator => "Generator",
            StageName::Reflector => "Reflector",
            StageName::Curator => "Curator",
        }
    }

    /// Position in the canonical order (Generator = 0).
    pub fn canonical_index(self) -> usize {
        match self {
            StageName::Generator => 0,
            StageName::Reflector => 1,
            StageName::Curator => 2,
        }
    }

    /// The role whose output this role consumes, if any.
    pub fn upstream(self) -> Option<StageName> {
        match self {
            StageName::Generator => None,
            StageName::Reflector => Some(StageName::Generator),
            StageName::Curator => Some(StageName::Reflector),
        }
    }
}

impl std::fmt::Display for StageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageName {
    type Err = String;

    /// Exact, case-sensitive match against the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageName::CANONICAL_ORDER
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_name_round_trips_through_display() {
        for name in StageName::CANONICAL_ORDER {
            assert_eq!(name.to_string().parse::<StageName>().unwrap(), name);
        }
    }

    #[test]
    fn test_stage_name_parse_is_case_sensitive() {
        assert!("generator".parse::<StageName>().is_err());
        assert!("Curater".parse::<StageName>().is_err());
    }

    #[test]
    fn test_canonical_index_matches_declared_order() {
        let indices: Vec<usize> = StageName::CANONICAL_ORDER
            .iter()
            .map(|n| n.canonical_index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(StageName::Generator < StageName::Curator);
    }

    #[test]
    fn test_upstream_forms_linear_chain() {
        assert_eq!(StageName::Generator.upstream(), None);
        assert_eq!(StageName::Reflector.upstream(), Some(StageName::Generator));
        assert_eq!(StageName::Curator.upstream(), Some(StageName::Reflector));
    }
}
