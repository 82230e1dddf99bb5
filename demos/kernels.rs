use anyhow::{anyhow, Result};
use image::RgbaImage;
use imgnum::{Canvas, Clamped, ImgArray, Kernel, Neighbourhood, Shape, ShowOptions, Surface};
use std::{env, path::PathBuf};

/// Writes every presented frame to a PNG file.
struct PngSurface {
    path: PathBuf,
}

impl Surface for PngSurface {
    fn present(&mut self, height: usize, width: usize, rgba: &[u8]) -> Result<()> {
        let img = RgbaImage::from_raw(width as u32, height as u32, rgba.to_vec())
            .ok_or_else(|| anyhow!("{height}x{width} frame does not fit its buffer"))?;

        img.save(&self.path)?;
        println!("Image saved at {}", self.path.display());
        Ok(())
    }
}

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/venom.png".to_string());

    let image = read_image(&path)?;
    println!("{:?}", image);

    // Gaussian blur, one channel at a time

    let channels = image.dsplit(&[])?;
    let blurred = channels
        .iter()
        .map(|channel| channel.gaussian_blur(1.0, 5, 5, 0.0))
        .collect::<Result<Vec<ImgArray<f32>>>>()?;
    let rest: Vec<&ImgArray<f32>> = blurred[1..].iter().collect();
    show(&blurred[0].dstack(&rest)?, "assets/blur.png")?;

    // Sharpen

    let grey = image.mean_channel()?;
    let sharpen = Kernel::new(&[
        vec![0.0, -1.0, 0.0],
        vec![-1.0, 5.0, -1.0],
        vec![0.0, -1.0, 0.0],
    ])?;
    show(&grey.conv2d(&sharpen, 0.0, 0.0)?, "assets/sharpen.png")?;

    // Edges

    show(&grey.laplacian(Neighbourhood::Four)?, "assets/edge.png")?;
    show(&grey.sobel_xy()?.stretch(0.0, 255.0)?, "assets/sobel.png")?;

    Ok(())
}

fn read_image(path: &str) -> Result<ImgArray<Clamped>> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();

    let shape = Shape::new(height as usize, width as usize, 3)?;
    ImgArray::from_bytes(img.as_raw(), shape)
}

fn show(array: &ImgArray<f32>, path: &str) -> Result<()> {
    let surface = PngSurface { path: path.into() };
    Canvas::from_array(array, &ShowOptions::default(), surface)?.show()?;

    Ok(())
}
