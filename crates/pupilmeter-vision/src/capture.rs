//! 눈 카메라 창 캡처.
//!
//! 다른 앱이 화면에 그리는 눈 카메라 창을 xcap으로 찾아 캡처한다.

use image::{DynamicImage, RgbaImage};
use pupilmeter_core::config::BorderInsets;
use pupilmeter_core::error::CoreError;
use tracing::{debug, info};
use xcap::Window;

/// 프레임 소스 (캡처 워커가 구동)
pub trait FrameSource: Send {
    /// 캡처 대상 연결
    fn hook(&mut self, target: &str) -> Result<(), CoreError>;

    /// 현재 프레임 한 장
    fn grab(&mut self) -> Result<DynamicImage, CoreError>;

    /// 연결 해제
    fn unhook(&mut self);

    fn is_hooked(&self) -> bool;
}

/// 창 제목으로 찾은 창을 캡처하는 소스
pub struct XcapWindowSource {
    border: BorderInsets,
    window: Option<Window>,
    target: Option<String>,
}

impl XcapWindowSource {
    pub fn new(border: BorderInsets) -> Self {
        Self {
            border,
            window: None,
            target: None,
        }
    }

    /// 현재 연결된 창 제목
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    fn find_window(title: &str) -> Result<Window, CoreError> {
        let windows = Window::all()
            .map_err(|e| CoreError::Capture(format!("창 목록 조회 실패: {e}")))?;

        windows
            .into_iter()
            .find(|w| w.title().map(|t| t == title).unwrap_or(false))
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "window".to_string(),
                id: title.to_string(),
            })
    }
}

impl FrameSource for XcapWindowSource {
    fn hook(&mut self, target: &str) -> Result<(), CoreError> {
        self.unhook();
        let window = Self::find_window(target)?;
        info!("캡처 창 연결: {target}");
        self.window = Some(window);
        self.target = Some(target.to_string());
        Ok(())
    }

    fn grab(&mut self) -> Result<DynamicImage, CoreError> {
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| CoreError::Capture("연결된 창 없음".to_string()))?;

        let image = window
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("창 캡처 실패: {e}")))?;

        let cropped = crop_border(image, self.border)?;
        Ok(DynamicImage::ImageRgb8(
            DynamicImage::ImageRgba8(cropped).to_rgb8(),
        ))
    }

    fn unhook(&mut self) {
        if let Some(target) = self.target.take() {
            debug!("캡처 창 연결 해제: {target}");
        }
        self.window = None;
    }

    fn is_hooked(&self) -> bool {
        self.window.is_some()
    }
}

/// 창 테두리 잘라내기
///
/// 남는 영역이 없으면 에러.
pub fn crop_border(image: RgbaImage, border: BorderInsets) -> Result<RgbaImage, CoreError> {
    if border == BorderInsets::default() {
        return Ok(image);
    }

    let (w, h) = image.dimensions();
    let horizontal = border.left.saturating_add(border.right);
    let vertical = border.top.saturating_add(border.bottom);
    if horizontal >= w || vertical >= h {
        return Err(CoreError::Capture(format!(
            "테두리 {horizontal}x{vertical}가 캡처 크기 {w}x{h}보다 큼"
        )));
    }

    Ok(image::imageops::crop_imm(&image, border.left, border.top, w - horizontal, h - vertical)
        .to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn no_border_keeps_image() {
        let img = gradient(8, 6);
        let out = crop_border(img.clone(), BorderInsets::default()).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn border_is_removed() {
        let border = BorderInsets {
            left: 1,
            top: 2,
            right: 3,
            bottom: 1,
        };
        let out = crop_border(gradient(10, 8), border).unwrap();
        assert_eq!(out.dimensions(), (6, 5));
        assert_eq!(out.get_pixel(0, 0), &Rgba([1, 2, 0, 255]));
    }

    #[test]
    fn oversized_border_is_error() {
        let border = BorderInsets {
            left: 5,
            right: 5,
            ..Default::default()
        };
        assert!(matches!(
            crop_border(gradient(10, 4), border),
            Err(CoreError::Capture(_))
        ));
    }

    #[test]
    fn grab_without_hook_fails() {
        let mut source = XcapWindowSource::new(BorderInsets::default());
        assert!(!source.is_hooked());
        assert!(source.grab().is_err());
        source.unhook();
        assert!(source.target().is_none());
    }
}
