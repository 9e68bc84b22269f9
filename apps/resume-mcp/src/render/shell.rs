/// Extras around the rendered body.
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    /// When set, a fixed app bar with a PDF download button fetching this URL is prepended.
    pub download_url: Option<String>,
}

impl ShellOptions {
    pub fn with_download(url: impl Into<String>) -> Self {
        ShellOptions {
            download_url: Some(url.into()),
        }
    }
}

const APP_BAR_MARKUP: &str = r#"
    <div class="app-bar no-print" style="position: fixed; top: 0; left: 0; right: 0; height: 56px; background: white; border-bottom: 1px solid hsl(214.3 31.8% 91.4%); display: flex; align-items: center; justify-content: space-between; padding: 0 24px; z-index: 50;">
        <h1 style="font-size: 18px; font-weight: 600; color: hsl(222.2 47.4% 11.2%); margin: 0;">Resume Preview</h1>
        <button id="download-btn" class="inline-flex items-center justify-center rounded-md text-sm font-medium h-9 w-9"
                style="background: transparent; border: 1px solid hsl(214.3 31.8% 91.4%); color: hsl(222.2 47.4% 11.2%);"
                onclick="downloadPDF()" title="Download PDF">
            <svg id="download-icon" xmlns="http://www.w3.org/2000/svg" width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">
                <path d="M21 15v4a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2v-4"></path>
                <polyline points="7 10 12 15 17 10"></polyline>
                <line x1="12" y1="15" x2="12" y2="3"></line>
            </svg>
            <svg id="download-spinner" class="hidden animate-spin" xmlns="http://www.w3.org/2000/svg" width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">
                <path d="M21 12a9 9 0 1 1-6.219-8.56"></path>
            </svg>
        </button>
    </div>
    <div class="no-print" style="height: 56px;"></div>
    <style>
        @media print { .no-print { display: none !important; } }
        @keyframes spin { from { transform: rotate(0deg); } to { transform: rotate(360deg); } }
        .animate-spin { animation: spin 1s linear infinite; }
        .hidden { display: none; }
        #download-btn:hover { background: hsl(214.3 31.8% 91.4%) !important; }
        #download-btn:disabled { opacity: 0.5; cursor: not-allowed; }
    </style>"#;

// `__DOWNLOAD_URL__` is replaced with a JSON string literal.
const DOWNLOAD_SCRIPT: &str = r#"
    <script>
        async function downloadPDF() {
            const btn = document.getElementById('download-btn');
            const icon = document.getElementById('download-icon');
            const spinner = document.getElementById('download-spinner');
            const reset = () => {
                icon.classList.remove('hidden');
                spinner.classList.add('hidden');
                btn.disabled = false;
            };

            btn.disabled = true;
            icon.classList.add('hidden');
            spinner.classList.remove('hidden');

            try {
                const response = await fetch(__DOWNLOAD_URL__);
                if (!response.ok) throw new Error('Download failed');

                const blob = await response.blob();
                const url = window.URL.createObjectURL(blob);
                const a = document.createElement('a');
                a.style.display = 'none';
                a.href = url;
                a.download = 'resume.pdf';
                document.body.appendChild(a);
                a.click();
                window.URL.revokeObjectURL(url);
                document.body.removeChild(a);
                setTimeout(reset, 500);
            } catch (error) {
                console.error('Download error:', error);
                reset();
                alert('Failed to download PDF. Please try again.');
            }
        }
    </script>"#;

fn app_bar(download_url: &str) -> String {
    // serde_json quoting yields a valid JS string literal; `</` is split so the URL cannot close the script tag.
    let literal = serde_json::Value::String(download_url.to_string())
        .to_string()
        .replace("</", "<\\/");
    format!(
        "{APP_BAR_MARKUP}{}",
        DOWNLOAD_SCRIPT.replace("__DOWNLOAD_URL__", &literal)
    )
}

/// Wraps a rendered body in the preview document.
pub(super) fn wrap(body: &str, css: &str, options: &ShellOptions) -> String {
    let style = if css.is_empty() {
        String::new()
    } else {
        format!("<style>{css}</style>")
    };
    let bar = options
        .download_url
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(app_bar)
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Resume Preview</title>
    <script src="https://cdn.tailwindcss.com"></script>
    {style}
</head>
<body>
    {bar}
    {body}
</body>
</html>"#
    )
}
