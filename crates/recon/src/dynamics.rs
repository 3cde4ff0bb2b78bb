//! Dynamics gate over the three external checkpoints.

/// Largest allowed drop between two checkpoints, in grade points.
pub const MAX_CHECKPOINT_DROP: f64 = 1.0;

/// False when the external grade fell by more than one point between any two
/// checkpoints taken in chronological order. Rises are always fine.
///
/// Callers pass absence-normalized values (absent = 0).
pub fn passes_dynamics(checkpoint_input: f64, checkpoint_interim: f64, checkpoint_final: f64) -> bool {
    let dropped = checkpoint_input - checkpoint_interim > MAX_CHECKPOINT_DROP
        || checkpoint_input - checkpoint_final > MAX_CHECKPOINT_DROP
        || checkpoint_interim - checkpoint_final > MAX_CHECKPOINT_DROP;
    !dropped
}
