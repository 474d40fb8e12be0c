use std::io::Read;

use ravepay::{Environment, RaveClient, RaveConfig, TransactionCipher, VerifyRequest, WireEncoding};

const USAGE: &str = "usage:
  rave-cli encrypt [PLAINTEXT]              encrypt PLAINTEXT (or stdin) with RAVE_SECRET_KEY
  rave-cli decrypt [CIPHERTEXT]             decrypt CIPHERTEXT (or stdin) with RAVE_SECRET_KEY
  rave-cli verify FLW_REF CURRENCY AMOUNT   requery a transaction";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ravepay=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        fail(USAGE);
    };

    match command.as_str() {
        "encrypt" | "decrypt" => {
            let cipher = cipher_from_env();
            let input = match args.get(1) {
                Some(text) => text.clone(),
                None => read_stdin(),
            };
            let result = if command == "encrypt" {
                cipher.encrypt(&input)
            } else {
                cipher.decrypt(&input)
            };
            match result {
                Ok(out) => println!("{out}"),
                Err(e) => fail(&e.to_string()),
            }
        }
        "verify" => {
            let [flw_ref, currency, amount] = match &args[1..] {
                [a, b, c] => [a, b, c],
                _ => fail(USAGE),
            };
            let amount: f64 = amount
                .parse()
                .unwrap_or_else(|_| fail(&format!("invalid AMOUNT: {amount}")));

            let config = RaveConfig::from_env().unwrap_or_else(|e| fail(&e.to_string()));
            let client = RaveClient::new(config).unwrap_or_else(|e| fail(&e.to_string()));
            let request = VerifyRequest::new(flw_ref.as_str(), currency.as_str(), amount);

            match client.verify_transaction(&request).await {
                Ok(result) => {
                    let confirmed = result.confirms(&request);
                    let json = serde_json::json!({ "result": result, "confirmed": confirmed });
                    println!("{json:#}");
                }
                Err(e) => fail(&e.to_string()),
            }
        }
        _ => fail(USAGE),
    }
}

fn cipher_from_env() -> TransactionCipher {
    let secret_key = std::env::var("RAVE_SECRET_KEY")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fail("RAVE_SECRET_KEY environment variable is required"));
    let encoding = match std::env::var("RAVE_WIRE_ENCODING") {
        Ok(name) => WireEncoding::parse(&name)
            .unwrap_or_else(|| fail(&format!("invalid RAVE_WIRE_ENCODING: {name}"))),
        Err(_) => WireEncoding::default(),
    };
    if let Ok(env) = std::env::var("RAVE_ENV") {
        if Environment::parse(&env) == Environment::Production {
            tracing::warn!("using a production secret key for local encryption");
        }
    }
    TransactionCipher::from_secret_key(&secret_key, encoding).unwrap_or_else(|e| fail(&e.to_string()))
}

fn read_stdin() -> String {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .unwrap_or_else(|e| fail(&format!("failed to read stdin: {e}")));
    buf.trim_end_matches(['\r', '\n']).to_string()
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}
