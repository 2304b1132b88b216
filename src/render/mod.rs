//! Drawing: the surface port, blend math, the software engine and the
//! compositor that walks a stack through them.

pub mod canvas;
pub mod composite;
pub mod compositor;
pub mod cpu;
pub mod text;

pub use canvas::{Canvas, CanvasEngine, LineJoin, TextAlign, TextBaseline, TextStyle};
pub use composite::{BlendMode, UnknownBlendMode};
pub use compositor::{Compositor, CompositorOpts, RenderWarning, Rendered, WarningKind};
pub use cpu::{CpuCanvas, CpuEngine, CpuEngineOpts};
pub use text::{CssFont, FontBook};
