/// Geometric axis of the gantry.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Axis {
    /// Moved by the X motor alone.
    X,
    /// Coupled axis: moved by stepping the X and Y motors together.
    Y,
}
