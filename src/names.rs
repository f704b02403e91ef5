use rand::Rng;

/// Name pools the circles introduce themselves with.
const MALE_NAMES: [&str; 30] = [
    "John", "James", "Ahmed", "David", "Michael", "Carlos", "Ali", "Daniel", "Luis", "Omar",
    "Thomas", "Kevin", "Brian", "Paul", "Mark", "Jose", "Juan", "Pedro", "Ryan", "Eric",
    "Victor", "Adam", "Noah", "Felix", "Marco", "Ivan", "Hugo", "Jonas", "Ravi", "Stefan",
];

const FEMALE_NAMES: [&str; 30] = [
    "Sarah", "Emma", "Derya", "Maria", "Sofia", "Anna", "Lisa", "Nina", "Mira", "Lena",
    "Julia", "Laura", "Maya", "Zara", "Leila", "Nora", "Diana", "Elena", "Clara", "Rosa",
    "Ines", "Alma", "Vera", "Iris", "Selma", "Ada", "Freya", "Noemi", "Tara", "Yuki",
];

/// Pick a random name from a randomly chosen pool.
pub fn random_speaker(rng: &mut impl Rng) -> &'static str {
    let pool: &[&'static str] = if rng.random_bool(0.5) {
        &FEMALE_NAMES
    } else {
        &MALE_NAMES
    };
    pool[rng.random_range(0..pool.len())]
}

/// Pick a companion name distinct from the first speaker's.
pub fn random_companion(rng: &mut impl Rng, speaker: &str) -> &'static str {
    for _ in 0..16 {
        let name = random_speaker(rng);
        if name != speaker {
            return name;
        }
    }
    // Pools overlap on nothing, so a collision can only mean we kept
    // re-drawing the same pool; fall back to the other one.
    if MALE_NAMES.contains(&speaker) {
        FEMALE_NAMES[0]
    } else {
        MALE_NAMES[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn companion_never_matches_speaker() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let speaker = random_speaker(&mut rng);
            let companion = random_companion(&mut rng, speaker);
            assert_ne!(speaker, companion);
        }
    }
}
