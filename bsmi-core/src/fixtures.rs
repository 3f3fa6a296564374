//! Shared test model used by the unit tests of the crate

use uuid::Uuid;

use crate::models::{
    Category, DomainOfExpertise, ElementDefinition, ElementUsage, Iteration, ModelInfo,
    ModelOption, Parameter, Relationship, Requirement, RequirementsGroup, Specification, ThingRef,
};

/// A small but complete iteration:
///
/// - SPEC-A: R-1 (CAT1), R-2 (CAT2, group G1), R-4 (SUB1), R-5 (CAT1, retired)
/// - SPEC-B: R-3 (CAT1, retired)
/// - SAT (top) uses BUS (BSMI 1200, satisfies R-1) and PAY (BSMI 1230, satisfies R-4)
/// - requirement links R-4 -> R-1, R-2 -> R-1, R-5 -> R-1
pub(crate) struct SampleModel {
    pub iteration: Iteration,
    pub spec_a: Uuid,
    pub spec_b: Uuid,
    pub r1: Uuid,
    pub r2: Uuid,
    pub r3: Uuid,
    pub r4: Uuid,
    pub r5: Uuid,
    pub cat1: Uuid,
    pub cat2: Uuid,
    pub sub1: Uuid,
    pub option: Uuid,
    pub sat: Uuid,
    pub bus: Uuid,
    pub payload: Uuid,
}

impl SampleModel {
    pub fn new() -> Self {
        let mut iteration = Iteration::new(1);
        iteration.description = "sample iteration".to_string();
        iteration.model = ModelInfo {
            short_name: "BSMI-Model".to_string(),
            name: "BSMI test model".to_string(),
            definition: "model used in tests".to_string(),
        };

        let sys = DomainOfExpertise::new("SYS");
        let cat1 = Category::new("CAT1");
        let cat2 = Category::new("CAT2");
        let mut sub1 = Category::new("SUB1");
        sub1.super_categories.push(cat1.id);

        let option = ModelOption::new("OPT-1");

        let mut spec_a = Specification::new("SPEC-A");
        let group = RequirementsGroup::new("G1", None);

        let mut r1 = Requirement::new("R-1", "The \"bus\" shall distribute power");
        r1.owner = Some(sys.id);
        r1.categories.push(cat1.id);

        let mut r2 = Requirement::new("R-2", "The payload shall image");
        r2.owner = Some(sys.id);
        r2.categories.push(cat2.id);
        r2.group = Some(group.id);

        let mut r4 = Requirement::new("R-4", "The camera shall be cooled");
        r4.owner = Some(sys.id);
        r4.categories.push(sub1.id);

        let mut r5 = Requirement::new("R-5", "Retired requirement");
        r5.categories.push(cat1.id);
        r5.retired = true;

        let mut spec_b = Specification::new("SPEC-B");
        let mut r3 = Requirement::new("R-3", "Retired requirement in B");
        r3.categories.push(cat1.id);
        r3.retired = true;

        let mut bus = ElementDefinition::new("Bus");
        bus.parameters.push(Parameter::new("BSMI", "1200"));
        let mut payload = ElementDefinition::new("Payload");
        payload.parameters.push(Parameter::new("BSMI", "1230"));
        let mut sat = ElementDefinition::new("SAT");
        sat.parameters.push(Parameter::new("MASS", "100"));
        sat.usages.push(ElementUsage::new("BUS", bus.id));
        sat.usages.push(ElementUsage::new("PAY", payload.id));

        let relationships = vec![
            Relationship::satisfies(ThingRef::Element(bus.id), ThingRef::Requirement(r1.id)),
            Relationship::satisfies(ThingRef::Element(payload.id), ThingRef::Requirement(r4.id)),
            Relationship::satisfies(ThingRef::Requirement(r4.id), ThingRef::Requirement(r1.id)),
            Relationship::satisfies(ThingRef::Requirement(r2.id), ThingRef::Requirement(r1.id)),
            Relationship::satisfies(ThingRef::Requirement(r5.id), ThingRef::Requirement(r1.id)),
        ];

        let sample = Self {
            spec_a: spec_a.id,
            spec_b: spec_b.id,
            r1: r1.id,
            r2: r2.id,
            r3: r3.id,
            r4: r4.id,
            r5: r5.id,
            cat1: cat1.id,
            cat2: cat2.id,
            sub1: sub1.id,
            option: option.id,
            sat: sat.id,
            bus: bus.id,
            payload: payload.id,
            iteration: Iteration::default(),
        };

        spec_a.groups.push(group);
        spec_a.requirements = vec![r1, r2, r4, r5];
        spec_b.requirements = vec![r3];

        iteration.domains.push(sys);
        iteration.categories = vec![cat1, cat2, sub1];
        iteration.options.push(option);
        iteration.top_element = Some(sat.id);
        iteration.elements = vec![sat, bus, payload];
        iteration.specifications = vec![spec_a, spec_b];
        iteration.relationships = relationships;

        Self { iteration, ..sample }
    }

    pub fn option(&self) -> &ModelOption {
        &self.iteration.options[0]
    }
}
