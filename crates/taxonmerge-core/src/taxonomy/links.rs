//! Parent and accepted link resolution.
//!
//! Links are worked out for every instance in parallel against the loaded
//! taxonomy and then written back in one sequential pass.

use super::Taxonomy;
use crate::element::{ElementRef, InstanceId};
use crate::error::{Result, TaxonomyError};
use crate::messages::{format_message, template};
use crate::report::IssueType;
use rayon::prelude::*;
use taxonmerge_model::{Rank, TaxonomicType};

#[derive(Debug, Default)]
struct Links {
    parent: Option<ElementRef>,
    accepted: Option<ElementRef>,
    status: Option<TaxonomicType>,
    provenance: Vec<String>,
}

/// `id - name`, whichever parts were supplied.
fn reference(id: Option<&str>, name: Option<&str>) -> String {
    match (id, name) {
        (Some(i), Some(n)) => format!("{} - {}", i, n),
        (Some(i), None) => i.to_string(),
        (None, Some(n)) => n.to_string(),
        (None, None) => String::new(),
    }
}

impl Taxonomy {
    /// Attach parent and accepted links to every instance.
    ///
    /// An instance with an unresolvable reference and nothing else to go on
    /// fails the whole phase once every instance has been tried.
    pub fn resolve_links(&mut self) -> Result<()> {
        tracing::info!(phase = "resolve_links", instances = self.instances.len(), "resolving links");
        let outcomes: Vec<Option<Links>> = (0..self.instances.len())
            .into_par_iter()
            .map(|i| self.compute_links(InstanceId::from_index(i)))
            .collect();
        let mut failed = 0usize;
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let Some(links) = outcome else {
                failed += 1;
                continue;
            };
            let tci = &mut self.instances[i];
            tci.parent = links.parent;
            tci.accepted = links.accepted;
            if let Some(status) = links.status {
                tci.status = status;
            }
            tci.provenance.extend(links.provenance);
        }
        if failed > 0 {
            tracing::error!(phase = "resolve_links", failed, "unresolvable links");
            return Err(TaxonomyError::Links);
        }
        tracing::info!(phase = "resolve_links", "resolved links");
        Ok(())
    }

    fn compute_links(&self, id: InstanceId) -> Option<Links> {
        let tci = self.instance(id);
        let mut links = Links::default();

        if let Some(pid) = &tci.parent_name_usage_id {
            links.parent = self.get_instance(pid).map(ElementRef::Instance);
        }
        if links.parent.is_none() {
            if let Some(pname) = &tci.parent_name_usage {
                links.parent = self.find_element(tci.code, pname, tci.provider, None);
            }
        }
        if links.parent.is_none() && (tci.parent_name_usage.is_some() || tci.parent_name_usage_id.is_some()) {
            let name = reference(tci.parent_name_usage_id.as_deref(), tci.parent_name_usage.as_deref());
            self.report_args(
                IssueType::Error,
                "instance.parent.invalidLink",
                &[tci.taxon_id.as_str(), tci.scientific_name.as_str(), name.as_str()],
            );
            if tci.accepted_name_usage_id.is_none() && tci.accepted_name_usage.is_none() && !tci.has_classification() {
                return None;
            }
            links
                .provenance
                .push(format_message("instance.parent.invalidLink.provenance", &[name]));
        }

        if let Some(aid) = &tci.accepted_name_usage_id {
            links.accepted = self.get_instance(aid).map(ElementRef::Instance);
        }
        if links.accepted.is_none() {
            if let Some(aname) = &tci.accepted_name_usage {
                links.accepted = self.find_element(tci.code, aname, tci.provider, None);
            }
        }
        if links.accepted.is_none() && (tci.accepted_name_usage.is_some() || tci.accepted_name_usage_id.is_some()) {
            let name = reference(tci.accepted_name_usage_id.as_deref(), tci.accepted_name_usage.as_deref());
            self.report_args(
                IssueType::Error,
                "instance.accepted.invalidLink",
                &[tci.taxon_id.as_str(), tci.scientific_name.as_str(), name.as_str()],
            );
            if !tci.has_classification() {
                return None;
            }
            links
                .provenance
                .push(format_message("instance.accepted.invalidLink.provenance", &[name]));
        }

        if links.parent.is_none() && links.accepted.is_none() {
            if let Some(classification) = &tci.classification {
                let mut genus = String::new();
                for (clr, term) in Rank::CLASSIFICATION {
                    if !tci.rank.is_loose() && !clr.is_higher_than(tci.rank) {
                        continue;
                    }
                    let Some(value) = classification.get(*term) else {
                        continue;
                    };
                    let name = match *term {
                        "genus" => {
                            genus = value.clone();
                            value.clone()
                        }
                        "specificEpithet" => format!("{} {}", genus, value).trim().to_string(),
                        _ => value.clone(),
                    };
                    if name.eq_ignore_ascii_case(&tci.scientific_name) {
                        continue;
                    }
                    let Some(p) = self.find_element(tci.code, &name, tci.provider, Some(*clr)) else {
                        continue;
                    };
                    if p == ElementRef::Instance(id) {
                        continue;
                    }
                    let pr = self.element_rank(p);
                    if tci.rank.is_loose() || pr.is_loose() || pr.is_higher_than(tci.rank) {
                        links.parent = Some(p);
                    }
                }
            }
        }

        if links.parent.is_none() && links.accepted.is_none() && !tci.rank.is_higher_than(Rank::Phylum) {
            self.count("count.resolve.instance.defaultParent");
            links.parent = self.find_default_parent(id);
            if links.parent.is_some() {
                links
                    .provenance
                    .push(template("instance.defaultParent.provenance").unwrap_or_default().to_string());
            }
        }

        if links.parent.is_some() && links.accepted.is_none() && tci.is_synonym() {
            links.status = Some(TaxonomicType::InferredAccepted);
            links
                .provenance
                .push(template("instance.inferredAccepted.provenance").unwrap_or_default().to_string());
        }
        self.count("count.resolve.instance.links");
        Some(links)
    }

    /// The provider's default parent taxon, looked up by name.
    fn find_default_parent(&self, id: InstanceId) -> Option<ElementRef> {
        let tci = self.instance(id);
        let code = tci.code?;
        let name = self.providers.default_parent_taxon(tci.provider)?;
        self.find_element(Some(code), name, tci.provider, None)
    }
}

#[cfg(test)]
mod tests {
    use super::reference;

    #[test]
    fn references_join_id_and_name() {
        assert_eq!(reference(Some("p1"), Some("Canis")), "p1 - Canis");
        assert_eq!(reference(None, Some("Canis")), "Canis");
        assert_eq!(reference(Some("p1"), None), "p1");
    }
}
