//! Genesis - one-time creation of a Spirit's genotype.

use spirit_core::genotype::{
    BASE_ANGER_RANGE, BASE_TRUST_RANGE, RITUAL_AFFINITY_RANGE, STUBBORNNESS_RANGE,
};
use spirit_core::{gaussian, RandomSource, SpiritGenotype, Temperament};
use std::ops::RangeInclusive;

const TRUST_NOISE: f64 = 0.10;
const ANGER_NOISE: f64 = 0.08;
const STUBBORNNESS_NOISE: f64 = 0.15;
const AFFINITY_NOISE: f64 = 0.12;

fn clamp_to(value: f64, range: &RangeInclusive<f64>) -> f64 {
    value.clamp(*range.start(), *range.end())
}

/// Weighted categorical draw over temperaments.
pub fn pick_temperament(rng: &mut dyn RandomSource) -> Temperament {
    let roll = rng.uniform();
    let mut cumulative = 0.0;
    for temperament in Temperament::ALL {
        cumulative += temperament.birth_weight();
        if roll < cumulative {
            return temperament;
        }
    }
    Temperament::Phlegmatic
}

/// Roll a new genotype: temperament baselines perturbed by Gaussian noise.
pub fn generate_genotype(rng: &mut dyn RandomSource) -> SpiritGenotype {
    let temperament = pick_temperament(rng);
    let traits = temperament.traits();

    let genotype = SpiritGenotype {
        temperament,
        base_trust: clamp_to(traits.base_trust + gaussian(rng, TRUST_NOISE), &BASE_TRUST_RANGE),
        base_anger: clamp_to(traits.base_anger + gaussian(rng, ANGER_NOISE), &BASE_ANGER_RANGE),
        stubbornness: clamp_to(
            traits.stubbornness + gaussian(rng, STUBBORNNESS_NOISE),
            &STUBBORNNESS_RANGE,
        ),
        ritual_affinity: clamp_to(
            traits.ritual_affinity + gaussian(rng, AFFINITY_NOISE),
            &RITUAL_AFFINITY_RANGE,
        ),
    };

    tracing::info!(
        "Genesis: {} spirit (trust {:.2}, anger {:.2}, stubbornness {:.2}, affinity {:.2})",
        genotype.temperament,
        genotype.base_trust,
        genotype.base_anger,
        genotype.stubbornness,
        genotype.ritual_affinity
    );
    genotype
}
