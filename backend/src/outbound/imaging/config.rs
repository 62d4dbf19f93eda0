//! Geometry, colours and assets of the control-number image.

use std::path::PathBuf;

use image::Rgba;

/// Everything the renderer needs to draw a ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlNumberImageConfig {
    pub width: u32,
    pub height: u32,
    pub canvas_color: Rgba<u8>,
    pub border_thickness: u32,
    pub border_pad: u32,
    pub border_color: Rgba<u8>,
    pub line_thickness: u32,
    pub line_spacing: u32,
    pub line_color: Rgba<u8>,
    pub font_path: PathBuf,
    pub font_color: Rgba<u8>,
    pub font_size: f32,
    pub logo_path: Option<PathBuf>,
    pub logo_pad: u32,
    pub qr_url_template: String,
    pub qr_size: u32,
}

impl Default for ControlNumberImageConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            canvas_color: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
            border_thickness: 20,
            border_pad: 10,
            border_color: Rgba([0x2E, 0x7D, 0x32, 0xFF]),
            line_thickness: 2,
            line_spacing: 16,
            line_color: Rgba([0xE0, 0xE0, 0xE0, 0xFF]),
            font_path: PathBuf::from("fonts/DejaVuSansMono-Bold.ttf"),
            font_color: Rgba([0x00, 0x00, 0x00, 0xFF]),
            font_size: 64.0,
            logo_path: None,
            logo_pad: 10,
            qr_url_template: "http://localhost/frequencia/%s/%s?verificacao=%s".to_owned(),
            qr_size: 120,
        }
    }
}

impl ControlNumberImageConfig {
    /// Distance from the canvas edge to the logo and QR code.
    pub fn corner_inset(&self) -> u32 {
        self.border_pad
            .saturating_add(self.border_thickness)
            .saturating_add(self.logo_pad)
    }
}

/// Substitute `args` into the `%s` placeholders of `template`, in order.
///
/// Surplus placeholders are left empty; surplus arguments are ignored.
///
/// # Examples
/// ```
/// use frequencia::outbound::imaging::fill_template;
///
/// let url = fill_template("https://x/%s/%s?v=%s", &["1", "2-3", "c"]);
/// assert_eq!(url, "https://x/1/2-3?v=c");
/// ```
pub fn fill_template(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut pieces = template.split("%s");
    if let Some(head) = pieces.next() {
        out.push_str(head);
    }
    for (index, piece) in pieces.enumerate() {
        out.push_str(args.get(index).copied().unwrap_or_default());
        out.push_str(piece);
    }
    out
}
