//! The page for uploading a CSV file of transactions.

use axum::{http::StatusCode, response::Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    shared::render,
};

fn import_form_view() -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::IMPORT)
            enctype="multipart/form-data"
            class="space-y-4 md:space-y-6 w-full max-w-md"
        {
            div
            {
                label for="file" class=(FORM_LABEL_STYLE)
                {
                    "Choose a file to upload"
                }

                input
                    id="file"
                    type="file"
                    name="file"
                    accept="text/csv"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                p class="mt-2 text-sm text-gray-500 dark:text-gray-400"
                {
                    "Upload a CSV file with the columns date, type, category, amount, and note. \
                    Rows that fail validation are skipped and reported."
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                "Upload file"
            }
        }
    }
}

/// Route handler for the import CSV page.
pub async fn get_import_page() -> Response {
    let content = html! {
        (NavBar::new(endpoints::IMPORT_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md"
            {
                h1 class="text-2xl font-bold mb-6" { "Import transactions" }

                (import_form_view())
            }
        }
    };

    render(StatusCode::OK, base("Import Transactions", &content))
}

#[cfg(test)]
mod import_page_tests {
    use axum::http::StatusCode;
    use scraper::{Html, Selector};

    use crate::{csv_io::import_page::get_import_page, endpoints};

    #[tokio::test]
    async fn render_page() {
        let response = get_import_page().await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let document = Html::parse_document(&String::from_utf8_lossy(&body));

        let form_selector = Selector::parse(&format!(
            "form[action='{}'][enctype='multipart/form-data']",
            endpoints::IMPORT
        ))
        .unwrap();
        assert!(document.select(&form_selector).next().is_some());

        let input_selector = Selector::parse("input[type='file'][name='file']").unwrap();
        let input = document.select(&input_selector).next().unwrap();
        assert_eq!(input.attr("accept"), Some("text/csv"));
        assert!(input.attr("required").is_some());
    }
}
