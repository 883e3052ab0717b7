//! End-to-end lookups against a canned transport, with logging.
//!
//! Run with: `RUST_LOG=sifen=debug cargo run --example lookup_demo --features service`

use sifen::core::*;
use sifen::service::*;
use tracing_subscriber::EnvFilter;

/// Stands in for the mutual-TLS SOAP client a deployment would provide.
struct CannedTransport;

impl Transport for CannedTransport {
    async fn send(&self, request: &SoapRequest) -> Result<String, SifenError> {
        let body = match &request.query {
            Query::Taxpayer { ruc } if ruc == "80012345" => format!(
                "<ns2:dCodRes>0502</ns2:dCodRes><ns2:dMsgRes>RUC encontrado</ns2:dMsgRes>\
                 <ns2:xContRUC><ns2:dRUCCons>{ruc}</ns2:dRUCCons><ns2:dRazCons>Acme Corp</ns2:dRazCons>\
                 <ns2:dCodEstCons>1</ns2:dCodEstCons><ns2:dDesEstCons>ACTIVO</ns2:dDesEstCons>\
                 <ns2:dRUCFactElec>S</ns2:dRUCFactElec></ns2:xContRUC>"
            ),
            Query::Taxpayer { .. } => {
                "<ns2:dCodRes>0500</ns2:dCodRes><ns2:dMsgRes>RUC no existe</ns2:dMsgRes>".to_string()
            }
            Query::Document { .. } => {
                return Err(SifenError::Transport("certificate not configured".into()));
            }
        };
        Ok(format!(
            r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope"><env:Body><ns2:rResEnviConsRUC xmlns:ns2="http://ekuatia.set.gov.py/sifen/xsd">{body}</ns2:rResEnviConsRUC></env:Body></env:Envelope>"#
        ))
    }
}

#[tokio::main]
async fn main() -> Result<(), SifenError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sifen=info")),
        )
        .init();

    let config = SifenConfig::from_env()?;
    println!("taxpayer endpoint: {}", config.taxpayer_service_url());
    let service = SifenService::new(CannedTransport, config);

    for ruc in ["80012345", "80012345", "99999999", "123"] {
        match service.lookup_taxpayer(ruc).await {
            Ok(result) => match result.payload {
                Some(taxpayer) => println!("{ruc}: {} ({})", taxpayer.legal_name, taxpayer.status_description),
                None => println!("{ruc}: {} {}", result.response_code, result.message),
            },
            Err(e) => println!("{ruc}: {e}"),
        }
    }

    let cdc = "01800123456001001000012322024010112345678901";
    if let Err(e) = service.lookup_document(cdc).await {
        println!("{cdc}: {e} (upstream: {})", e.is_upstream());
    }

    println!(
        "cached taxpayers: {}",
        service.cache().entry_count(EntityKind::Taxpayer).await
    );
    Ok(())
}
