//! Fuzz target for the absorbing-chain and stationary-vector solvers.
//!
//! Arbitrary small weight matrices, including zero rows and huge or tiny
//! weights, must produce a result or an error without panicking.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pal_core::absorption::absorption_probabilities;
use pal_core::graph::CsrMatrix;
use pal_core::spectral::{stationary_distribution, EigenOptions};

#[derive(Debug, Arbitrary)]
struct ChainInput {
    size: u8,
    weights: Vec<u16>,
    absorbing: Vec<u8>,
}

fuzz_target!(|input: ChainInput| {
    let n = (input.size % 12) as usize + 1;
    if input.weights.len() < n * n {
        return;
    }
    let dense: Vec<f64> = input.weights[..n * n]
        .iter()
        .map(|&w| f64::from(w) / 1024.0)
        .collect();
    let Ok(chain) = CsrMatrix::from_dense(n, n, &dense) else {
        return;
    };
    let absorbing: Vec<usize> = input.absorbing.iter().map(|&s| s as usize).collect();
    let _ = absorption_probabilities(&chain, &absorbing);

    if let Ok(stochastic) = chain.normalize_rows() {
        let options = EigenOptions {
            max_iterations: 50,
            tolerance: 1e-8,
        };
        let _ = stationary_distribution(&stochastic, options);
    }
});
