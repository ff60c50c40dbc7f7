// rules.rs - The B3/S23 transition rule

/// Next state of a cell from its own state and the number of live neighbors.
#[inline]
pub fn next_state(alive: bool, alive_neighbors: usize) -> bool {
    match (alive, alive_neighbors) {
        (true, 2) | (true, 3) => true, // Survival
        (false, 3) => true,            // Birth
        _ => false,                    // Death or stays dead
    }
}
