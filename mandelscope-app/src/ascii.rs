use mandelscope_render::{Display, Explorer, PreviewImage};

/// Characters from dark to bright.
const RAMP: &[u8] = b" .:-=+*#%@";

/// Draw whatever the explorer currently displays as ASCII art.
pub(crate) fn render(
    explorer: &Explorer,
    cols: u32,
    rows: u32,
) -> mandelscope_render::Result<String> {
    let image = match explorer.display() {
        Display::Blank => return Ok(String::from("(nothing rendered)")),
        Display::Frame(frame) => frame.downsample(cols, rows),
        Display::Preview(placement) => {
            let Some(size) = explorer.size() else {
                return Ok(String::from("(nothing rendered)"));
            };
            placement.rasterize(size)?.downsample(cols, rows)
        }
    };
    Ok(to_ascii(&image))
}

fn to_ascii(image: &PreviewImage) -> String {
    let mut out = String::with_capacity((image.width() as usize + 1) * image.height() as usize);
    for y in 0..image.height() {
        for x in 0..image.width() {
            let level = image.pixel(x, y) as usize * (RAMP.len() - 1) / 255;
            out.push(RAMP[level] as char);
        }
        if y + 1 < image.height() {
            out.push('\n');
        }
    }
    out
}
