// src/scrapers/tjsp.rs

//! TJSP adapter (e-SAJ public consultation).
//!
//! Reference implementation of the [`CourtScraper`] contract: builds the
//! e-SAJ query from the canonical case number, then extracts fields with
//! CSS selectors. Serves as the template for further court adapters.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Document, Movement, Party, ScraperConfig};
use crate::scrapers::client::FetchClient;
use crate::scrapers::{CourtScraper, ExtractedProcess};
use crate::utils::{normalize_whitespace, only_digits, parse_currency, parse_date_flexible};

pub const BASE_URL: &str = "https://esaj.tjsp.jus.br";
pub const SEARCH_URL: &str = "https://esaj.tjsp.jus.br/cpopg/search.do";

/// Formats accepted for the distribution timestamp.
const DISTRIBUTION_FORMATS: [&str; 2] = ["%d/%m/%Y às %H:%M", "%d/%m/%Y"];

/// Format of movement dates in the docket table.
const MOVEMENT_FORMATS: [&str; 1] = ["%d/%m/%Y"];

/// Scraper for Tribunal de Justiça de São Paulo.
pub struct TjspScraper {
    client: FetchClient,
}

impl TjspScraper {
    /// Create a scraper with its own HTTP session.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: FetchClient::new(config)?,
        })
    }

    /// Re-hyphenate canonical digits into the court's displayed format.
    ///
    /// `12345678920241234567` becomes `1234567-89.2024.1.23.4567`. Inputs
    /// that are not 20 digits after stripping pass through digit-only.
    pub fn format_case_number(case_number: &str) -> String {
        let clean = only_digits(case_number);
        if clean.len() == 20 {
            format!(
                "{}-{}.{}.{}.{}.{}",
                &clean[0..7],
                &clean[7..9],
                &clean[9..13],
                &clean[13..14],
                &clean[14..16],
                &clean[16..20]
            )
        } else {
            clean
        }
    }

    fn selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }

    fn text_of(element: ElementRef) -> String {
        normalize_whitespace(&element.text().collect::<String>())
    }

    /// First matching element's text, or `None` when absent or blank.
    fn first_text(document: &Html, selector: &Selector) -> Option<String> {
        document
            .select(selector)
            .next()
            .map(Self::text_of)
            .filter(|text| !text.is_empty())
    }

    /// Parse the search result page into process fields.
    fn parse_search_page(html: &str) -> Result<ExtractedProcess> {
        let document = Html::parse_document(html);

        let subject_sel = Self::selector("span#labelAssuntoProcesso")?;
        let class_sel = Self::selector("span#classeProcesso")?;
        let area_sel = Self::selector("div#areaProcesso span")?;
        let distribution_sel = Self::selector("div#dataHoraDistribuicaoProcesso")?;
        let judge_sel = Self::selector("span#juizProcesso")?;
        let value_sel = Self::selector("div#valorAcaoProcesso span")?;

        let mut extracted = ExtractedProcess {
            raw_html: html.to_string(),
            ..ExtractedProcess::default()
        };

        extracted.subject = Self::first_text(&document, &subject_sel);
        extracted.class_type = Self::first_text(&document, &class_sel);
        extracted.area = Self::first_text(&document, &area_sel);
        extracted.judge = Self::first_text(&document, &judge_sel);

        extracted.distribution_date = Self::first_text(&document, &distribution_sel)
            .and_then(|text| parse_date_flexible(&text, Some(&DISTRIBUTION_FORMATS)))
            .map(|dt| dt.and_utc());

        extracted.case_value =
            Self::first_text(&document, &value_sel).and_then(|text| parse_currency(&text));

        extracted.plaintiffs = Self::parse_parties(&document, "Autor")?;
        extracted.defendants = Self::parse_parties(&document, "Réu")?;
        extracted.lawyers = Self::parse_lawyers(&document)?;

        Ok(extracted)
    }

    /// Extract parties of one role from the main parties table.
    fn parse_parties(document: &Html, role: &str) -> Result<Vec<Party>> {
        let row_sel = Self::selector("table#tablePartesPrincipais tr")?;
        let type_sel = Self::selector("td.tipoParteProcesso")?;
        let name_sel = Self::selector("td.nomeParteProcesso")?;

        let role_lower = role.to_lowercase();
        let mut parties = Vec::new();

        for row in document.select(&row_sel) {
            let Some(type_cell) = row.select(&type_sel).next() else {
                continue;
            };
            if !Self::text_of(type_cell).to_lowercase().contains(&role_lower) {
                continue;
            }
            if let Some(name_cell) = row.select(&name_sel).next() {
                let name = Self::text_of(name_cell);
                if !name.is_empty() {
                    parties.push(Party::new(name, role));
                }
            }
        }

        Ok(parties)
    }

    /// Lawyers are rendered outside the parties table.
    fn parse_lawyers(document: &Html) -> Result<Vec<Party>> {
        let lawyer_sel = Self::selector("span.mensagemExibindo")?;

        let mut lawyers = Vec::new();
        for span in document.select(&lawyer_sel) {
            let text = Self::text_of(span);
            // Matches "Advogado"/"Advogada".
            if text.contains("Advogad") {
                lawyers.push(Party::new(text, "Advogado"));
            }
        }
        Ok(lawyers)
    }

    /// Parse the docket table into ordered movements.
    ///
    /// Rows whose date cell does not parse are skipped; the site sometimes
    /// pads the table with annotation rows.
    fn parse_movements_page(html: &str) -> Result<Vec<Movement>> {
        let document = Html::parse_document(html);

        let row_sel = Self::selector("tbody#tabelaTodasMovimentacoes tr.containerMovimentacao")?;
        let date_sel = Self::selector("td.dataMovimentacao")?;
        let desc_sel = Self::selector("td.descricaoMovimentacao")?;
        let type_sel = Self::selector("span.tipoMovimentacao")?;

        let mut movements = Vec::new();
        for row in document.select(&row_sel) {
            let (Some(date_cell), Some(desc_cell)) =
                (row.select(&date_sel).next(), row.select(&desc_sel).next())
            else {
                continue;
            };

            let Some(date) = parse_date_flexible(&Self::text_of(date_cell), Some(&MOVEMENT_FORMATS))
            else {
                log::debug!("Skipping movement row with unparsable date");
                continue;
            };

            let movement_type = desc_cell
                .select(&type_sel)
                .next()
                .map(Self::text_of)
                .unwrap_or_else(|| "Sem tipo".to_string());

            // The type label is rendered inside the description cell;
            // subtract it to keep only the free text.
            let full_text = Self::text_of(desc_cell);
            let description = normalize_whitespace(&full_text.replacen(&movement_type, "", 1));

            movements.push(Movement {
                date: date.and_utc(),
                movement_type,
                description,
                complementary_info: None,
                responsible: None,
            });
        }

        Ok(movements)
    }
}

#[async_trait]
impl CourtScraper for TjspScraper {
    fn acronym(&self) -> &str {
        "TJSP"
    }

    async fn search_process(&self, case_number: &str) -> Result<ExtractedProcess> {
        let formatted = Self::format_case_number(case_number);
        let digit_year = formatted.split('-').next().unwrap_or(&formatted).to_string();
        let origin = formatted.rsplit('.').next().unwrap_or("").to_string();

        let params: [(&str, &str); 8] = [
            ("conversationId", ""),
            ("dadosConsulta.localPesquisa.cdLocal", "-1"),
            ("cbPesquisa", "NUMPROC"),
            ("dadosConsulta.tipoNuProcesso", "UNIFICADO"),
            ("numeroDigitoAnoUnificado", &digit_year),
            ("foroNumeroUnificado", &origin),
            ("dadosConsulta.valorConsultaNuUnificado", &formatted),
            ("dadosConsulta.valorConsulta", ""),
        ];

        let html = self.client.fetch(SEARCH_URL, &params).await?;
        Self::parse_search_page(&html)
    }

    async fn get_movements(&self, case_number: &str) -> Result<Vec<Movement>> {
        let formatted = Self::format_case_number(case_number);
        let params: [(&str, &str); 2] = [
            ("dadosConsulta.valorConsultaNuUnificado", &formatted),
            ("cbPesquisa", "NUMPROC"),
        ];

        let html = self.client.fetch(SEARCH_URL, &params).await?;
        Self::parse_movements_page(&html)
    }

    async fn get_documents(&self, _case_number: &str) -> Result<Vec<Document>> {
        // The e-SAJ document list requires an authenticated session.
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::only_digits;

    const CANONICAL: &str = "12345678920241234567";

    #[test]
    fn test_format_case_number() {
        assert_eq!(
            TjspScraper::format_case_number(CANONICAL),
            "1234567-89.2024.1.23.4567"
        );
    }

    #[test]
    fn test_format_round_trips_to_canonical() {
        let formatted = TjspScraper::format_case_number(CANONICAL);
        assert_eq!(only_digits(&formatted), CANONICAL);
    }

    #[test]
    fn test_format_passes_short_input_through() {
        assert_eq!(TjspScraper::format_case_number("12-34"), "1234");
    }

    const SEARCH_PAGE: &str = r##"
        <html><body>
          <span id="classeProcesso">Procedimento Comum Cível</span>
          <div id="areaProcesso"><span>Cível</span></div>
          <span id="labelAssuntoProcesso">Cobrança de Aluguéis</span>
          <div id="dataHoraDistribuicaoProcesso">12/03/2024 às 14:30</div>
          <span id="juizProcesso">Dra. Maria Silva</span>
          <div id="valorAcaoProcesso"><span>R$ 15.000,00</span></div>
          <table id="tablePartesPrincipais">
            <tr>
              <td class="tipoParteProcesso">Autor</td>
              <td class="nomeParteProcesso">João  da Silva</td>
            </tr>
            <tr>
              <td class="tipoParteProcesso">Réu</td>
              <td class="nomeParteProcesso">Imobiliária Central Ltda</td>
            </tr>
          </table>
          <span class="mensagemExibindo">Advogado: Carlos Souza</span>
        </body></html>"##;

    #[test]
    fn test_parse_search_page_fields() {
        let extracted = TjspScraper::parse_search_page(SEARCH_PAGE).unwrap();

        assert_eq!(extracted.subject.as_deref(), Some("Cobrança de Aluguéis"));
        assert_eq!(
            extracted.class_type.as_deref(),
            Some("Procedimento Comum Cível")
        );
        assert_eq!(extracted.area.as_deref(), Some("Cível"));
        assert_eq!(extracted.judge.as_deref(), Some("Dra. Maria Silva"));
        assert_eq!(
            extracted.case_value,
            Some(rust_decimal::Decimal::new(15000, 0))
        );
        assert!(extracted.raw_html.contains("tablePartesPrincipais"));

        assert_eq!(extracted.plaintiffs.len(), 1);
        assert_eq!(extracted.plaintiffs[0].name, "João da Silva");
        assert_eq!(extracted.plaintiffs[0].role, "Autor");
        assert_eq!(extracted.defendants.len(), 1);
        assert_eq!(extracted.defendants[0].name, "Imobiliária Central Ltda");
        assert_eq!(extracted.lawyers.len(), 1);
        assert_eq!(extracted.lawyers[0].role, "Advogado");
    }

    #[test]
    fn test_parse_search_page_distribution_date() {
        let extracted = TjspScraper::parse_search_page(SEARCH_PAGE).unwrap();
        let dt = extracted.distribution_date.unwrap();
        assert_eq!(dt.format("%d/%m/%Y %H:%M").to_string(), "12/03/2024 14:30");
    }

    #[test]
    fn test_parse_search_page_missing_fields_are_absent() {
        let extracted = TjspScraper::parse_search_page("<html><body></body></html>").unwrap();
        assert!(extracted.subject.is_none());
        assert!(extracted.case_value.is_none());
        assert!(extracted.distribution_date.is_none());
        assert!(extracted.plaintiffs.is_empty());
        assert!(extracted.lawyers.is_empty());
    }

    const MOVEMENTS_PAGE: &str = r##"
        <html><body>
          <table><tbody id="tabelaTodasMovimentacoes">
            <tr class="containerMovimentacao">
              <td class="dataMovimentacao">15/04/2024</td>
              <td class="descricaoMovimentacao">
                <span class="tipoMovimentacao">Conclusos</span>
                Autos conclusos para despacho
              </td>
            </tr>
            <tr class="containerMovimentacao">
              <td class="dataMovimentacao">10/04/2024</td>
              <td class="descricaoMovimentacao">
                <span class="tipoMovimentacao">Juntada</span>
                Juntada de petição
              </td>
            </tr>
            <tr class="containerMovimentacao">
              <td class="dataMovimentacao">sem data</td>
              <td class="descricaoMovimentacao">Linha inválida</td>
            </tr>
          </tbody></table>
        </body></html>"##;

    #[test]
    fn test_parse_movements_page() {
        let movements = TjspScraper::parse_movements_page(MOVEMENTS_PAGE).unwrap();
        assert_eq!(movements.len(), 2);

        assert_eq!(movements[0].movement_type, "Conclusos");
        assert_eq!(movements[0].description, "Autos conclusos para despacho");
        assert_eq!(
            movements[0].date.format("%d/%m/%Y").to_string(),
            "15/04/2024"
        );

        assert_eq!(movements[1].movement_type, "Juntada");
        assert_eq!(movements[1].description, "Juntada de petição");
    }

    #[test]
    fn test_parse_movements_empty_page() {
        let movements =
            TjspScraper::parse_movements_page("<html><body></body></html>").unwrap();
        assert!(movements.is_empty());
    }
}
