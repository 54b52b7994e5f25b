//! Message templates for issue codes and provenance statements.
//!
//! Templates use positional placeholders. Element reports fill them as
//!
//! | slot | value |
//! |---|---|
//! | `{0}` | taxon id of the subject |
//! | `{1}` | display name of the subject |
//! | `{2}` | associated taxon ids, `\|` separated |
//! | `{3}` | description of the subject |
//! | `{4}` | description of the associated elements |
//!
//! Argument reports fill slots in order.

use ahash::AHashMap;
use std::sync::OnceLock;

const MESSAGES: &[(&str, &str)] = &[
    // Loading
    ("taxonomy.load.placeholder", "Placeholder name {1} for {0}"),
    ("taxonomy.load.placeholder.remark", "Placeholder name"),
    ("taxonomy.load.no_name", "No usable name for {0} {1}"),
    ("taxonomy.load.no_name.provenance", "Forbidden as it has no usable name"),
    ("taxonomy.load.as_is", "Name {1} for {0} loaded as-is"),
    ("taxonomy.load.forbidden", "Forbidden {0} {1}: {2}"),
    ("taxonomy.load.forbidden.provenance", "Forbidden by provider rule: {0}"),
    ("taxonomy.load.collision", "Duplicate taxon id {0} for {1}, re-keyed as {2}"),
    ("taxonomy.load.collision.provenance", "Re-keyed from duplicate taxon id {0}"),
    ("taxonomy.load.provider", "Created provider {0} for unknown dataset {1}"),
    ("taxonomy.unknownTaxon.remark", "Placeholder for taxa with an unknown position in the taxonomy"),
    // Link resolution
    ("instance.parent.invalidLink", "Parent {2} for {0} {1} not found"),
    ("instance.accepted.invalidLink", "Accepted taxon {2} for {0} {1} not found"),
    ("instance.parent.invalidLink.provenance", "Unable to find supplied parent taxon {0}"),
    ("instance.accepted.invalidLink.provenance", "Unable to find accepted taxon {0}"),
    ("instance.defaultParent.provenance", "Assigned to default parent taxon"),
    ("instance.inferredAccepted.provenance", "Synonym without accepted taxon treated as accepted"),
    // Loops
    ("instance.accepted.resolve.loop", "Accepted loop for {0} {1} through {2}"),
    ("instance.accepted.resolve.loop.provenance", "Accepted taxon removed from {0} to break a synonym loop"),
    ("instance.accepted.synonym.loop", "Synonym {0} is the parent of its own accepted taxon {1}"),
    ("instance.accepted.synonym.loop.provenance", "Accepted taxon removed to break a synonym/parent loop"),
    ("instance.parent.resolve.loop", "Parent loop for {0} {1} through {2}"),
    ("instance.parent.resolve.loop.provenance", "Moved to the unknown taxon to break a parent loop"),
    ("instance.parent.resolve.invalid", "Invalid parent for {0} {1}"),
    ("instance.parent.resolve.invalid.provenance", "Moved to the unknown taxon as the supplied parent is invalid"),
    // Validation
    ("instance.validation.noParent", "No parent for {0} {1}"),
    ("instance.validation.noParent.loose", "No parent for {0} {1} from loose source"),
    ("instance.validation.noAccepted", "No accepted taxon for {0} {1}"),
    ("instance.validation.noAccepted.loose", "No accepted taxon for {0} {1} from loose source"),
    ("instance.validation.synonymWithParent", "Synonym {0} {1} has a parent"),
    ("instance.validation.acceptedWithAccepted", "Accepted taxon {0} {1} has an accepted taxon"),
    ("instance.validation.noTaxonConcept", "No taxon concept for {0} {1}"),
    ("instance.validation.noScientificName", "No scientific name for {0} {1}"),
    ("instance.validation.parent.loop", "Parent loop for {0} {1} through {2}"),
    ("taxonConcept.validation.noInstances", "No instances for concept {3}"),
    ("taxonConcept.validation.instanceParent", "Instance {0} {1} not contained by {4}"),
    ("taxonConcept.validation.instanceTaxonomy", "Instance {0} {1} in {4} is not the registered instance"),
    ("scientificName.validation.noConcepts", "No concepts for name {3}"),
    ("scientificName.validation.conceptParent", "Concept {3} not contained by {4}"),
    ("provider.validation.unknownTaxonID.notFound", "Unknown taxon {1} for provider {0} not found"),
    ("provider.validation.unknownTaxonID.noID", "No unknown taxon id for provider {0}"),
    ("name.homonym", "Homonym {0} with {1} different keys"),
    // Resolution
    ("taxonResolver.noPrincipals", "No principals for {3}, using all non-geographic instances"),
    ("taxonResolver.noProvider", "No authority for {3}"),
    ("taxonResolver.synthetic.removed", "Synthetic instance {0} {1} removed in favour of a primary principal"),
    ("taxonResolver.synonyms", "Accepted {0} {1} resolved to synonym bound {2}"),
    ("taxonResolver.validation.noResolution", "No resolution for {0} {1}"),
    ("taxonResolution.added", "Added {0} {1} to used instances"),
    ("taxonConcept.unresolved", "Concept {3} resolved after fixpoint"),
    ("taxonConcept.reallocated", "Reallocated {3} to {4}"),
    ("taxonConcept.reallocated.provenance", "Reallocated to {0} {1}"),
    ("taxonConcept.reallocated.secondary", "Secondary concept {4} reallocated to {3}"),
    ("taxonConcept.reallocated.secondary.provenance", "Secondary concept reallocated to {0} {1}"),
    ("taxonConcept.representative", "No representative for {3} when adding inferred synonyms for {4}"),
    ("taxonConcept.inferredSynonyms", "No inferred synonyms from {4} to {3}"),
    ("taxonConcept.multipleInferredSynonyms", "Multiple inferred synonyms for {3}: {2}"),
    ("taxonConcept.unranked.reallocate", "Unranked {0} {1} reallocated as {2}"),
    ("taxonConcept.unranked.reallocate.provenance", "Rank assigned as {0} from unranked"),
    ("taxonConcept.vernacular.preferred", "Preferred vernacular for {0} {1} is {2}"),
    ("instance.inferredSynonym.provenance", "Inferred synonym of {0} from {1}"),
    ("scientificName.collision", "Authored concepts collide on {3}: {4}"),
    ("scientificName.collision.match", "Equal scores for concepts of {3}: {4}"),
    ("scientificName.reallocated", "Reallocated name {3} to {4}"),
    ("unrankedScientificName.collision", "Ranked names collide on {3}: {4}"),
    ("unrankedScientificName.collision.warn", "Equal scores for ranked names of {3}: {4}"),
    ("unrankedScientificName.reallocated", "Reallocated unranked name {3} to {4}"),
    ("unrankedScientificName.reallocated.provenance", "Unranked name reallocated to {0} {1}"),
    ("uncodedScientificName.collision", "Coded names collide on {3}: {4}"),
    ("uncodedScientificName.collision.warn", "Equal scores for coded names of {3}: {4}"),
    ("uncodedScientificName.reallocated", "Reallocated uncoded name {3} to {4}"),
    ("uncodedScientificName.reallocated.provenance", "Uncoded name reallocated to {0} {1}"),
    ("name.ScientificName.noPrincipal", "No principal concept for {3}"),
    ("name.ScientificName.principal", "Principal concept for {3} is {4}"),
    ("name.UnrankedScientificName.noPrincipal", "No principal name for unranked {3}"),
    ("name.UnrankedScientificName.principal", "Principal name for unranked {3} is {4}"),
    ("name.BareName.noPrincipal", "No principal name for bare {3}"),
    ("name.BareName.principal", "Principal name for bare {3} is {4}"),
    // Discards
    ("instance.discarded.synthetic", "Synthetic instance {0} {1} is not needed"),
    ("instance.discarded.identifier.title", "Discarded taxon"),
    ("instance.discarded.identifier.provenance", "Discarded {0} and kept as an identifier of the parent"),
    ("instance.discarded.synonym.provenance", "Discarded {0} and turned into a synonym of the parent"),
    // Output
    ("taxonomy.output.resolution", "Unable to resolve {0} {1}: {2}"),
];

fn messages() -> &'static AHashMap<&'static str, &'static str> {
    static TABLE: OnceLock<AHashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| MESSAGES.iter().copied().collect())
}

pub fn template(code: &str) -> Option<&'static str> {
    messages().get(code).copied()
}

/// Fill a template. Unknown codes render as the code followed by the
/// arguments.
pub fn format_message<S: AsRef<str>>(code: &str, args: &[S]) -> String {
    let Some(template) = template(code) else {
        let rest: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        return format!("{} {}", code, rest.join(", ")).trim_end().to_string();
    };
    let mut out = String::with_capacity(template.len() + 32);
    let mut chars = template.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c == '{' {
            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            if !digits.is_empty() && chars.peek().map(|&(_, d)| d) == Some('}') {
                chars.next();
                if let Some(arg) = digits.parse::<usize>().ok().and_then(|i| args.get(i)) {
                    out.push_str(arg.as_ref());
                }
                continue;
            }
            out.push('{');
            out.push_str(&digits);
            continue;
        }
        out.push(c);
    }
    out
}
