//! The per-session engine driving every other component.
//!
//! This module provides:
//! - [`AutofillEngine`], one per renderer session, fed one event at a time
//! - The form cache: parse on sight, look up on query/fill, clear on
//!   navigation
//! - The query, fill, submission and classification-response flows
//!
//! Everything runs on a single sequential execution context; there is no
//! locking anywhere. Asynchronous work leaves through the transport and
//! comes back only as later events, so no state is touched reentrantly.

use log::{debug, warn};

use crate::config::EngineConfig;
use crate::field_types::FieldTypeGroup;
use crate::fill::{fill_card_field, fill_profile_field};
use crate::form::parsed::ParsedForm;
use crate::form::{FormData, FormField};
use crate::opaque_ids::OpaqueIdTable;
use crate::quality::{determine_possible_types, log_submission_quality, MetricsSink};
use crate::records::{PaymentCard, PersonalDataStore, Profile};
use crate::requests::{parse_query_response, ClassificationTransport, RequestScheduler};
use crate::section::{find_section_bounds, section_is_autofilled};
use crate::suggestions::{card_suggestions, profile_suggestions, SuggestionSet, WarningKind};

/// Form autofill engine for one renderer session.
///
/// The engine owns the parsed-form cache and the opaque ID table and
/// borrows everything else from its collaborators: records come from the
/// [`PersonalDataStore`], classification traffic leaves through the
/// [`ClassificationTransport`], quality events go to the [`MetricsSink`].
pub struct AutofillEngine<S, T, M>
where
    S: PersonalDataStore,
    T: ClassificationTransport,
    M: MetricsSink,
{
    config: EngineConfig,
    store: S,
    scheduler: RequestScheduler<T>,
    metrics: M,
    cache: Vec<ParsedForm>,
    id_table: OpaqueIdTable,
    pending_import: Option<PaymentCard>,
}

impl<S, T, M> AutofillEngine<S, T, M>
where
    S: PersonalDataStore,
    T: ClassificationTransport,
    M: MetricsSink,
{
    pub fn new(config: EngineConfig, store: S, transport: T, metrics: M) -> Self {
        AutofillEngine {
            config,
            store,
            scheduler: RequestScheduler::new(transport),
            metrics,
            cache: Vec::new(),
            id_table: OpaqueIdTable::new(),
            pending_import: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn transport(&self) -> &T {
        self.scheduler.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.scheduler.transport_mut()
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut M {
        &mut self.metrics
    }

    pub fn cached_form_count(&self) -> usize {
        self.cache.len()
    }

    /// Parses newly rendered forms into the cache and asks the
    /// classification service about everything cached so far.
    ///
    /// Queryable forms enter the cache before the query goes out;
    /// non-queryable ones are appended afterwards, in page order, so they
    /// are available at submission time without ever being queried.
    pub fn on_forms_seen(&mut self, forms: &[FormData]) {
        if !self.config.autofill_enabled {
            return;
        }

        let mut non_queryable = Vec::new();
        for form in forms {
            let parsed = ParsedForm::from_form(form);
            if !parsed.is_parseable() {
                debug!(target: "autofill", "ignoring unparseable form \"{}\"", form.name);
                continue;
            }
            if parsed.is_queryable() {
                self.cache.push(parsed);
            } else {
                non_queryable.push(parsed);
            }
        }

        if !self.cache.is_empty() {
            self.scheduler.query_forms(&self.cache);
        }
        self.cache.append(&mut non_queryable);
    }

    /// Answers a suggestion query for the given field.
    ///
    /// Misses (unknown form or field, nothing stored, no candidates) come
    /// back as an empty set. A non-empty candidate list is replaced by a
    /// single warning row when autofill is globally disabled or a payment
    /// field is queried on a page without transport encryption.
    pub fn on_query(&mut self, form: &FormData, field: &FormField) -> SuggestionSet {
        let (form_index, field_index) = match self.find_cached_form_and_field(form, field) {
            Some(found) => found,
            None => return SuggestionSet::default(),
        };
        let parsed = &self.cache[form_index];
        if !parsed.is_autofillable() {
            return SuggestionSet::default();
        }
        if self.store.profiles().is_empty() && self.store.payment_cards().is_empty() {
            return SuggestionSet::default();
        }

        let target_type = parsed.field(field_index).effective_type();
        let is_payment = target_type.group() == FieldTypeGroup::Payment;
        let mut suggestions = if is_payment {
            card_suggestions(target_type, field, self.store.payment_cards(), &mut self.id_table)
        } else {
            profile_suggestions(
                parsed,
                target_type,
                field,
                self.store.profiles(),
                &mut self.id_table,
            )
        };

        // An empty candidate list stays empty; warnings would only nag.
        if suggestions.is_empty() {
            return suggestions;
        }

        if !self.config.autofill_enabled {
            return SuggestionSet::warning(WarningKind::AutofillDisabled);
        }
        if is_payment && !parsed.is_secure_source() {
            return SuggestionSet::warning(WarningKind::InsecurePayment);
        }

        let (section_start, section_end) =
            find_section_bounds(parsed, field_index, is_payment);
        if section_is_autofilled(parsed, form, section_start, section_end) {
            // The user is editing a value they already accepted; labels and
            // icons carry no information they don't have.
            suggestions.blank_labels_and_icons();
        }
        suggestions.remove_duplicates();
        suggestions
    }

    /// Fills the chosen record's values into the target field's section and
    /// returns the updated form. `None` when any lookup misses.
    pub fn on_fill_request(
        &mut self,
        form: &FormData,
        field: &FormField,
        unique_id: i32,
    ) -> Option<FormData> {
        if !self.config.autofill_enabled {
            return None;
        }
        if self.store.profiles().is_empty() && self.store.payment_cards().is_empty() {
            return None;
        }
        let (form_index, field_index) = self.find_cached_form_and_field(form, field)?;

        let (card_guid, profile_guid) = self.id_table.unpack(unique_id);
        debug_assert!(card_guid.is_empty() || profile_guid.is_empty());

        let profile: Option<Profile> = if profile_guid.is_empty() {
            None
        } else {
            self.store
                .profiles()
                .iter()
                .find(|p| p.guid == profile_guid)
                .cloned()
        };
        let card: Option<PaymentCard> = if card_guid.is_empty() {
            None
        } else {
            self.store
                .payment_cards()
                .iter()
                .find(|c| c.guid == card_guid)
                .cloned()
        };
        if profile.is_none() && card.is_none() {
            return None;
        }

        let parsed = &self.cache[form_index];
        let want_payment = card.is_some();
        let (section_start, section_end) =
            find_section_bounds(parsed, field_index, want_payment);

        let mut result = form.clone();

        // An already filled section means the user is replacing one value;
        // touch only the target field and leave the history alone.
        if section_is_autofilled(parsed, form, section_start, section_end) {
            let target_type = parsed.field(field_index).effective_type();
            for live in result.fields.iter_mut() {
                if live.same_control(field) {
                    if let Some(profile) = &profile {
                        fill_profile_field(profile, target_type, live);
                    } else if let Some(card) = &card {
                        fill_card_field(card, target_type, live);
                    }
                    break;
                }
            }
            return Some(result);
        }

        // The cached section and the live field list usually line up index
        // for index; when the page has drifted, search forward in the cached
        // fields for a counterpart of the current live field.
        let mut i = section_start;
        let mut j = 0;
        while i < section_end && j < result.fields.len() {
            let mut k = i;
            while k < section_end && !parsed.field(k).matches(&result.fields[j]) {
                k += 1;
            }

            if k < section_end {
                let field_type = parsed.field(k).effective_type();
                if field_type.group() != FieldTypeGroup::Unknown {
                    if let Some(profile) = &profile {
                        fill_profile_field(profile, field_type, &mut result.fields[j]);
                    } else if let Some(card) = &card {
                        fill_card_field(card, field_type, &mut result.fields[j]);
                    }
                }
                i += 1;
            }
            j += 1;
        }

        let signature = parsed.signature();
        self.scheduler.note_autofilled(signature);
        Some(result)
    }

    /// Analyzes a submitted form: grades prediction quality, votes to the
    /// classification service, and scans for importable records. A detected
    /// payment card is returned as a pending import offer; everything else
    /// imports silently.
    pub fn on_form_submitted(&mut self, form: &FormData) -> Option<PaymentCard> {
        if !self.config.autofill_enabled {
            return None;
        }
        if self.config.off_the_record {
            return None;
        }
        // Submissions driven by page script say nothing about the user's
        // data.
        if !form.user_submitted {
            return None;
        }

        let mut submitted = ParsedForm::from_form(form);
        if !submitted.is_queryable() {
            return None;
        }

        determine_possible_types(&self.store, &mut submitted);

        match self.find_cached_form(form) {
            Some(cached_index) => {
                log_submission_quality(&submitted, &self.cache[cached_index], &mut self.metrics);
            }
            None => {
                debug!(
                    target: "autofill",
                    "submitted form \"{}\" has no cached counterpart", form.name
                );
            }
        }

        self.scheduler.upload_form(&submitted, &self.config);

        if !submitted.is_autofillable() {
            return None;
        }

        let offer = self.store.import_form_records(&submitted);
        self.pending_import = offer.clone();
        offer
    }

    /// Resolves the pending import offer from the last submission.
    pub fn on_import_decision(&mut self, accepted: bool) {
        let card = self.pending_import.take();
        if !accepted {
            return;
        }
        if let Some(card) = card {
            self.store.save_imported_card(&card);
        }
    }

    /// Applies a classification response to the cached forms it still
    /// matches. Malformed payloads are dropped whole; individual stale
    /// blocks are skipped.
    pub fn on_classification_response(&mut self, payload: &str) {
        let response = match parse_query_response(payload) {
            Ok(response) => response,
            Err(error) => {
                warn!(target: "autofill", "dropping malformed classification response: {error}");
                return;
            }
        };

        for predictions in &response.forms {
            let matched = self.cache.iter_mut().find(|parsed| {
                parsed.signature() == predictions.signature
                    && parsed.field_count() == predictions.field_types.len()
            });
            match matched {
                Some(parsed) => {
                    parsed.apply_server_predictions(
                        &predictions.field_types,
                        &response.experiment_id,
                    );
                }
                None => {
                    debug!(
                        target: "autofill",
                        "stale predictions for form signature {:016x}", predictions.signature
                    );
                }
            }
        }
    }

    /// The page navigated away; cached forms are gone. IDs already handed
    /// out, the autofilled history and any pending import offer survive.
    pub fn on_navigation_committed(&mut self) {
        self.cache.clear();
    }

    fn find_cached_form(&self, form: &FormData) -> Option<usize> {
        self.cache.iter().position(|parsed| parsed.matches_form(form))
    }

    fn find_cached_form_and_field(
        &self,
        form: &FormData,
        field: &FormField,
    ) -> Option<(usize, usize)> {
        let form_index = self.find_cached_form(form)?;
        let parsed = &self.cache[form_index];
        // A form nothing was recognized in has nothing to offer.
        if parsed.autofill_count() == 0 {
            return None;
        }
        let field_index = parsed.fields().iter().position(|f| f.matches(field))?;
        Some((form_index, field_index))
    }
}
