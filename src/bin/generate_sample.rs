/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn next_usize(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

/// Logistic growth: carrying capacity `k_cap`, rate `k`, inoculum `n0`.
fn logistic(t: f64, n0: f64, k_cap: f64, k: f64) -> f64 {
    k_cap / (1.0 + ((k_cap - n0) / n0) * (-k * t).exp())
}

fn sequence_literal(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", items.join(", "))
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // Nominal sampling grid: every 6 h for 48 h.
    let nominal_times: Vec<f64> = (0..9).map(|i| i as f64 * 6.0).collect();

    // (condition, carrying capacity, growth rate, target morphology score,
    //  precipitation factor)
    let conditions: [(&str, f64, f64, f64, f64); 6] = [
        ("Control", 1.6e6, 0.22, 1.00, 0.05),
        ("LB + 1% glucose", 2.4e6, 0.30, 1.15, 0.10),
        ("LB + 5% glucose", 2.9e6, 0.34, 1.35, 0.30),
        ("LB + NaCl stress", 0.9e6, 0.12, 1.80, 0.55),
        ("M9 minimal", 0.7e6, 0.09, 1.25, 0.08),
        ("M9 + casamino acids", 1.2e6, 0.16, 1.10, 0.12),
    ];
    let replicates_per_condition = 3;
    let inoculum = 5.0e4;

    let output_path = "growth_curves.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record([
            "Condition",
            "Time after seeding",
            "Cell count",
            "Morphology",
            "Precipitation",
            "Average morphology",
            "Growth rate (k)",
            "Average precipitation",
        ])
        .expect("Failed to write header");

    let mut rows = 0usize;
    for &(condition, k_cap, k, morphology_target, precipitation_factor) in &conditions {
        for _ in 0..replicates_per_condition {
            // Replicates end at different timepoints so the loaded table is
            // ragged, the way real exports tend to be.
            let n_points = nominal_times.len() - rng.next_usize(3);

            let times: Vec<f64> = nominal_times[..n_points]
                .iter()
                .map(|&t| if t == 0.0 { 0.0 } else { t + rng.gauss(0.0, 0.05) })
                .collect();

            let rate = k * (1.0 + rng.gauss(0.0, 0.05));
            let counts: Vec<f64> = times
                .iter()
                .map(|&t| logistic(t, inoculum, k_cap, rate) * (1.0 + rng.gauss(0.0, 0.03)))
                .collect();

            // Morphology drifts from 1.0 toward the condition's target as
            // the culture saturates.
            let morphology: Vec<f64> = times
                .iter()
                .zip(&counts)
                .map(|(_, &n)| {
                    let saturation = n / k_cap;
                    1.0 + (morphology_target - 1.0) * saturation + rng.gauss(0.0, 0.02)
                })
                .collect();

            let precipitation: Vec<f64> = counts
                .iter()
                .map(|&n| (n / k_cap) * precipitation_factor * (1.0 + rng.gauss(0.0, 0.05)))
                .collect();

            let average_morphology =
                morphology.iter().sum::<f64>() / morphology.len() as f64;
            let average_precipitation =
                precipitation.iter().sum::<f64>() / precipitation.len() as f64;

            writer
                .write_record([
                    condition.to_string(),
                    sequence_literal(&times),
                    sequence_literal(&counts),
                    sequence_literal(&morphology),
                    sequence_literal(&precipitation),
                    format!("{average_morphology:.4}"),
                    format!("{rate:.4}"),
                    format!("{average_precipitation:.4}"),
                ])
                .expect("Failed to write record");
            rows += 1;
        }
    }

    writer.flush().expect("Failed to flush output file");
    println!(
        "Wrote {rows} replicates across {} conditions to {output_path}",
        conditions.len()
    );
}
