//! `isa` values of the record kinds the editor understands.

pub const BUILD_FILE: &str = "PBXBuildFile";
pub const FILE_REFERENCE: &str = "PBXFileReference";
pub const GROUP: &str = "PBXGroup";
pub const VARIANT_GROUP: &str = "PBXVariantGroup";
pub const VERSION_GROUP: &str = "XCVersionGroup";
pub const SOURCES_BUILD_PHASE: &str = "PBXSourcesBuildPhase";
pub const NATIVE_TARGET: &str = "PBXNativeTarget";
pub const AGGREGATE_TARGET: &str = "PBXAggregateTarget";
pub const LEGACY_TARGET: &str = "PBXLegacyTarget";

/// Kinds that name a buildable target.
pub const TARGETS: &[&str] = &[NATIVE_TARGET, AGGREGATE_TARGET, LEGACY_TARGET];

/// Kinds whose `children` list holds other objects.
pub const CONTAINERS: &[&str] = &[GROUP, VARIANT_GROUP, VERSION_GROUP];

/// Whether `isa` is one of the build phase kinds (`PBX…BuildPhase`).
pub fn is_build_phase(isa: &str) -> bool {
    isa.starts_with("PBX") && isa.ends_with("BuildPhase")
}
