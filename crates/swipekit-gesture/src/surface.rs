use swipekit_geometry::{Point, Size};

/// Host-side view of the watched element.
///
/// The tracker only reads geometry; the draggable controller additionally
/// writes positions through [`Surface::set_offset`]. Implementations map
/// these calls onto whatever the host uses for layout (inline styles,
/// transforms, a retained scene graph).
pub trait Surface {
    /// The element's position relative to its containing block, in pixels.
    fn offset(&self) -> Point;

    /// The element's own size.
    fn size(&self) -> Size;

    /// The containing block's size.
    fn parent_size(&self) -> Size;

    /// Moves the element to `position`, in parent-relative pixels.
    ///
    /// Infallible by contract: callers validate geometry before writing.
    fn set_offset(&self, position: Point);

    /// Removes any position previously written by [`Surface::set_offset`],
    /// restoring the host's own layout. Called on disposal.
    fn clear_offset(&self) {}
}
