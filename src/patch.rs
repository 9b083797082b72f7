use crate::ast::Document;

/// Merges `patch` into `base`.
///
/// Sections missing from `base` are moved in whole. For sections present in
/// both, patch properties overwrite and patch registry entries are appended.
/// The patch is trusted: nothing is validated or re-resolved.
pub fn apply_patch(base: &mut Document, patch: Document) {
    for (name, section) in patch.sections {
        match base.sections.get_mut(&name) {
            Some(existing) => {
                tracing::trace!(section = %name, "patching section");
                for (key, value) in section.properties {
                    existing.properties.insert(key, value);
                }
                existing.registry.extend(section.registry);
            }
            None => {
                tracing::trace!(section = %name, "adding section from patch");
                base.sections.insert(name, section);
            }
        }
    }
}
