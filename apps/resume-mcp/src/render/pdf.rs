use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::{Browser, BrowserConfig};
use futures_util::StreamExt;
use tracing::{debug, info};

use super::RenderError;

const PDF_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns a complete HTML document into PDF bytes.
///
/// Carried by the renderer as `Arc<dyn PdfPrinter>` so tests run without a browser.
#[async_trait]
pub trait PdfPrinter: Send + Sync {
    async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Prints through headless Chrome over the DevTools protocol.
///
/// With a websocket URL it attaches to an already running browser; otherwise
/// it launches a local one per request. One attempt, bounded by 30 seconds.
pub struct ChromePdfPrinter {
    ws_url: Option<String>,
    timeout: Duration,
}

impl ChromePdfPrinter {
    pub fn new(ws_url: Option<String>) -> Self {
        ChromePdfPrinter {
            ws_url,
            timeout: PDF_TIMEOUT,
        }
    }

    async fn print_once(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let (mut browser, mut handler) = match &self.ws_url {
            Some(url) => {
                debug!(%url, "Connecting to remote browser");
                Browser::connect(url.as_str()).await.map_err(pdf_error)?
            }
            None => {
                let config = BrowserConfig::builder().build().map_err(RenderError::Pdf)?;
                Browser::launch(config).await.map_err(pdf_error)?
            }
        };

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = async {
            let url = format!("data:text/html;base64,{}", STANDARD.encode(html));
            let page = browser.new_page(url).await.map_err(pdf_error)?;
            page.wait_for_navigation().await.map_err(pdf_error)?;
            let params = PrintToPdfParams {
                print_background: Some(true),
                ..Default::default()
            };
            let bytes = page.pdf(params).await.map_err(pdf_error)?;
            let _ = page.close().await;
            Ok::<_, RenderError>(bytes)
        }
        .await;

        // A connected remote browser is shared and stays up.
        if self.ws_url.is_none() {
            let _ = browser.close().await;
            let _ = browser.wait().await;
        }
        events.abort();
        result
    }
}

#[async_trait]
impl PdfPrinter for ChromePdfPrinter {
    async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let bytes = tokio::time::timeout(self.timeout, self.print_once(html))
            .await
            .map_err(|_| RenderError::Pdf(format!("timed out after {}s", self.timeout.as_secs())))??;
        info!(bytes = bytes.len(), "PDF generated");
        Ok(bytes)
    }
}

fn pdf_error(e: chromiumoxide::error::CdpError) -> RenderError {
    RenderError::Pdf(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_remote_browser_is_pdf_error() {
        let printer = ChromePdfPrinter::new(Some("ws://127.0.0.1:9/devtools/browser/none".into()));
        let err = printer.print("<p>hi</p>").await.unwrap_err();
        assert!(matches!(err, RenderError::Pdf(_)));
    }
}
