// crates/bhd-assist-core/src/runtime/context.rs
// ============================================================================
// Module: BHD Assist Level Resolver
// Description: Computes the effective assistance level for a request context.
// Purpose: Clamp deep lab requests to validation-only unless every condition holds.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! [`resolve`] is a pure function. Deep lab requirements are checked in a
//! fixed order (environment, authorization, ownership) and the first unmet
//! requirement clamps the request to `ValidationOnly`. Unrecognized values
//! never satisfy a requirement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AssistanceContext;
use crate::core::AssistanceLevel;
use crate::core::LevelResolution;
use crate::core::RequestedLevel;
use crate::core::TargetOwner;

// ============================================================================
// SECTION: Requirements
// ============================================================================

/// One named precondition for deep lab mode.
struct Requirement {
    /// Context field name used in clamp reasons.
    name: &'static str,
    /// Expected value description used in clamp reasons.
    expected: &'static str,
    /// Returns the observed value when the requirement is unmet.
    unmet: fn(&AssistanceContext) -> Option<String>,
}

/// Deep lab requirements, in evaluation order.
const DEEP_LAB_REQUIREMENTS: [Requirement; 3] = [
    Requirement {
        name: "environment",
        expected: "lab or ctf",
        unmet: |context| {
            (!context.environment.is_training_ground())
                .then(|| context.environment.as_str().to_string())
        },
    },
    Requirement {
        name: "authorized",
        expected: "true",
        unmet: |context| (!context.authorized).then(|| "false".to_string()),
    },
    Requirement {
        name: "target_owner",
        expected: "self",
        unmet: |context| {
            (context.target_owner != TargetOwner::SelfOwned)
                .then(|| context.target_owner.as_str().to_string())
        },
    },
];

/// Reason recorded when every deep lab requirement holds.
const DEEP_LAB_ENABLED: &str =
    "deep_lab_enabled: environment=lab/ctf, authorized=true, target_owner=self";

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves the effective assistance level for a context.
///
/// # Invariants
/// - Never returns [`AssistanceLevel::Reserved`].
/// - Returns `LabTraining` only when every deep lab requirement holds.
pub fn resolve(context: &AssistanceContext) -> LevelResolution {
    match &context.requested_level {
        RequestedLevel::Standard => LevelResolution {
            effective_level: AssistanceLevel::ValidationOnly,
            reasons: vec!["requested_level=standard".to_string()],
            clamped: false,
        },
        RequestedLevel::Unrecognized(raw) => LevelResolution {
            effective_level: AssistanceLevel::ValidationOnly,
            reasons: vec![format!("requested_level={raw} unrecognized (treated as standard)")],
            clamped: false,
        },
        RequestedLevel::DeepLab => resolve_deep_lab(context),
    }
}

/// Applies the deep lab requirements in order, failing fast.
fn resolve_deep_lab(context: &AssistanceContext) -> LevelResolution {
    for requirement in &DEEP_LAB_REQUIREMENTS {
        if let Some(actual) = (requirement.unmet)(context) {
            return LevelResolution {
                effective_level: AssistanceLevel::ValidationOnly,
                reasons: vec![format!(
                    "clamped: {}={actual} (requires {})",
                    requirement.name, requirement.expected
                )],
                clamped: true,
            };
        }
    }
    LevelResolution {
        effective_level: AssistanceLevel::LabTraining,
        reasons: vec![DEEP_LAB_ENABLED.to_string()],
        clamped: false,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::resolve;
    use crate::core::AssistanceContext;
    use crate::core::AssistanceLevel;
    use crate::core::Environment;
    use crate::core::RequestedLevel;
    use crate::core::TargetOwner;

    #[test]
    fn unrecognized_environment_clamps_with_raw_value() {
        let context = AssistanceContext::new(
            Environment::parse("staging"),
            true,
            TargetOwner::SelfOwned,
            RequestedLevel::DeepLab,
        );
        let resolution = resolve(&context);
        assert_eq!(resolution.effective_level, AssistanceLevel::ValidationOnly);
        assert_eq!(
            resolution.reasons,
            vec!["clamped: environment=staging (requires lab or ctf)".to_string()]
        );
    }

    #[test]
    fn unrecognized_requested_level_is_standard() {
        let context = AssistanceContext::new(
            Environment::Lab,
            true,
            TargetOwner::SelfOwned,
            RequestedLevel::Unrecognized("turbo".to_string()),
        );
        let resolution = resolve(&context);
        assert_eq!(resolution.effective_level, AssistanceLevel::ValidationOnly);
        assert!(!resolution.clamped);
    }
}
