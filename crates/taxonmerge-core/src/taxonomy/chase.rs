//! Chasing resolved, accepted and parent chains.
//!
//! ```text
//!   resolved:          tci ─resolution─► r ─resolution─► ... (fixpoint)
//!   resolved accepted: resolved ─accepted─► representative ─► resolved accepted ...
//!   resolved parent:   resolved accepted ─parent─► representative ─► resolved accepted
//! ```
//!
//! Forbidden stops are skipped by moving up to their parent. Every chase is
//! bounded by [`MAX_RESOLUTION_STEPS`]. In tracing mode the elements visited
//! are recorded and failures fall back quietly instead of raising.

use super::Taxonomy;
use crate::element::{ElementRef, InstanceId};
use crate::error::ResolutionError;
use crate::MAX_RESOLUTION_STEPS;

type ChaseResult = std::result::Result<Option<InstanceId>, ResolutionError>;

struct Chase<'a> {
    taxonomy: &'a Taxonomy,
    original: InstanceId,
    trace: Option<Vec<ElementRef>>,
    raise: bool,
}

impl<'a> Chase<'a> {
    fn new(taxonomy: &'a Taxonomy, original: InstanceId, tracing: bool) -> Self {
        Self {
            taxonomy,
            original,
            trace: tracing.then(|| vec![ElementRef::Instance(original)]),
            raise: !tracing,
        }
    }

    fn forbidden(&self, id: InstanceId) -> bool {
        self.taxonomy.instance(id).forbidden
    }

    fn either_forbidden(&self, id: InstanceId) -> bool {
        self.forbidden(self.original) || self.forbidden(id)
    }

    fn error(&self, kind: &'static str) -> ResolutionError {
        ResolutionError::Loop {
            kind,
            taxon_id: self.taxonomy.instance(self.original).taxon_id.clone(),
            trace: self.trace_ids(),
        }
    }

    fn trace_ids(&self) -> Vec<String> {
        self.trace
            .iter()
            .flatten()
            .map(|e| {
                self.taxonomy
                    .element_taxon_id(*e)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.taxonomy.describe(*e))
            })
            .collect()
    }

    fn seen(&self, element: ElementRef) -> bool {
        self.trace.as_ref().map(|t| t.contains(&element)).unwrap_or(false)
    }

    fn record(&mut self, element: ElementRef) {
        if let Some(trace) = &mut self.trace {
            trace.push(element);
        }
    }

    fn resolved(&self, id: InstanceId, steps: usize) -> ChaseResult {
        if steps == 0 {
            if self.forbidden(id) {
                return Ok(None);
            }
            return Err(self.error("resolved"));
        }
        let resolved = self.taxonomy.resolved_once(id);
        match resolved {
            Some(r) if r != id => self.resolved(r, steps - 1),
            other => Ok(other),
        }
    }

    fn accepted(&mut self, id: InstanceId, steps: usize) -> ChaseResult {
        if steps == 0 {
            if self.either_forbidden(id) {
                return Ok(None);
            }
            if self.raise {
                return Err(self.error("accepted"));
            }
            return Ok(Some(self.original));
        }
        let Some(resolved) = self.resolved(id, steps - 1)? else {
            if self.either_forbidden(id) {
                return Ok(None);
            }
            if self.raise {
                return Err(ResolutionError::Dangling {
                    taxon_id: self.taxonomy.instance(self.original).taxon_id.clone(),
                    trace: self.trace_ids(),
                });
            }
            return Ok(Some(self.original));
        };
        let ae = match self.taxonomy.instance(resolved).accepted() {
            None => return Ok(Some(resolved)),
            Some(ElementRef::Instance(a)) if a == resolved => return Ok(Some(resolved)),
            Some(ae) => ae,
        };
        if self.seen(ae) {
            self.record(ae);
            if self.raise {
                return Err(self.error("accepted"));
            }
            return Ok(Some(self.original));
        }
        self.record(ae);
        let Some(representative) = self.taxonomy.representative(ae) else {
            tracing::warn!(element = %self.taxonomy.describe(ae), "no representative resolving accepted");
            return Ok(Some(resolved));
        };
        let Some(accepted) = self.accepted(representative, steps - 1)? else {
            tracing::warn!(element = %self.taxonomy.describe(ae), "no resolved accepted for representative");
            return Ok(Some(resolved));
        };
        if !self.forbidden(accepted) {
            return Ok(Some(accepted));
        }
        self.parent(accepted, steps - 1)
    }

    fn parent(&mut self, id: InstanceId, steps: usize) -> ChaseResult {
        if steps == 0 {
            if self.either_forbidden(id) {
                return Ok(None);
            }
            if self.raise {
                return Err(self.error("parent"));
            }
            return Ok(None);
        }
        let Some(resolved) = self.accepted(id, steps - 1)? else {
            return Ok(None);
        };
        let Some(pe) = self.taxonomy.instance(resolved).parent() else {
            return Ok(None);
        };
        let Some(parent) = self.taxonomy.representative(pe) else {
            return Ok(None);
        };
        let Some(parent) = self.accepted(parent, steps - 1)? else {
            return Ok(None);
        };
        let element = ElementRef::Instance(parent);
        if self.seen(element) {
            self.record(element);
            if self.raise {
                return Err(self.error("parent"));
            }
            return Ok(None);
        }
        self.record(element);
        if !self.forbidden(parent) {
            return Ok(Some(parent));
        }
        self.parent(parent, steps - 1)
    }
}

impl Taxonomy {
    /// One resolution step through the containing concept. `None` when the
    /// instance has no concept or its concept has no mapping for it.
    pub(crate) fn resolved_once(&self, id: InstanceId) -> Option<InstanceId> {
        let container = self.instance(id).container()?;
        self.concept(container).get_resolved(id)
    }

    /// Follow resolutions to the instance that stands for `id`.
    pub fn resolved(&self, id: InstanceId) -> std::result::Result<Option<InstanceId>, ResolutionError> {
        Chase::new(self, id, false).resolved(id, MAX_RESOLUTION_STEPS)
    }

    pub fn resolved_accepted(&self, id: InstanceId) -> std::result::Result<Option<InstanceId>, ResolutionError> {
        Chase::new(self, id, false).accepted(id, MAX_RESOLUTION_STEPS)
    }

    pub fn resolved_parent(&self, id: InstanceId) -> std::result::Result<Option<InstanceId>, ResolutionError> {
        Chase::new(self, id, false).parent(id, MAX_RESOLUTION_STEPS)
    }

    /// The elements visited while resolving the accepted taxon, starting with `id`.
    pub fn trace_accepted(&self, id: InstanceId) -> Vec<ElementRef> {
        let mut chase = Chase::new(self, id, true);
        let _ = chase.accepted(id, MAX_RESOLUTION_STEPS);
        chase.trace.unwrap_or_default()
    }

    pub fn trace_parent(&self, id: InstanceId) -> Vec<ElementRef> {
        let mut chase = Chase::new(self, id, true);
        let _ = chase.parent(id, MAX_RESOLUTION_STEPS);
        chase.trace.unwrap_or_default()
    }
}
