use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use std::io::Cursor;

/// Configuración del renderizado QR
#[derive(Debug, Clone, Copy)]
pub struct QrEncoderConfig {
    /// Tamaño de cada módulo en píxeles
    pub module_px: u32,
    /// Margen blanco alrededor del código
    pub quiet_zone: bool,
}

impl Default for QrEncoderConfig {
    fn default() -> Self {
        Self {
            module_px: 10,
            quiet_zone: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QrEncodeError {
    #[error("Error al crear QR code: {0}")]
    Qr(String),

    #[error("Error al escribir imagen PNG: {0}")]
    Image(#[from] image::ImageError),
}

/// Imagen QR lista para embeber en una respuesta
#[derive(Debug, Clone)]
pub struct QrImage {
    pub png: Vec<u8>,
    pub base64: String,
}

impl QrImage {
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.base64)
    }
}

/// Codificador QR sin estado: URL → PNG + base64
#[derive(Debug, Clone, Copy, Default)]
pub struct QrEncoder {
    pub config: QrEncoderConfig,
}

impl QrEncoder {
    pub fn new(config: QrEncoderConfig) -> Self {
        Self { config }
    }

    pub fn encode(&self, url: &str) -> Result<QrImage, QrEncodeError> {
        let code = QrCode::new(url.as_bytes()).map_err(|e| QrEncodeError::Qr(e.to_string()))?;

        let module = self.config.module_px.max(1);
        let image = code
            .render::<Luma<u8>>()
            .module_dimensions(module, module)
            .quiet_zone(self.config.quiet_zone)
            .dark_color(Luma([0u8]))
            .light_color(Luma([255u8]))
            .build();

        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image).write_to(&mut buffer, ImageFormat::Png)?;
        let png = buffer.into_inner();
        let base64 = STANDARD.encode(&png);

        Ok(QrImage { png, base64 })
    }
}
