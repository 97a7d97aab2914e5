//! Store endpoint URLs
//!
//! Sign-in goes to a host picked by attempt kind: `p25-buy` for plain
//! sign-ins, `p71-buy` when a verification code rides along. Download
//! grants always use `p25-buy`; purchases use the bare `buy` host.

pub(crate) enum StoreEndpoint<'a> {
    Authenticate { prefix: &'a str, guid: &'a str },
    Download { guid: &'a str },
    Buy,
}

impl StoreEndpoint<'_> {
    pub(crate) fn url(&self) -> String {
        match self {
            Self::Authenticate { prefix, guid } => format!(
                "https://{prefix}-buy.itunes.apple.com/WebObjects/MZFinance.woa/wa/authenticate?guid={guid}"
            ),
            Self::Download { guid } => format!(
                "https://p25-buy.itunes.apple.com/WebObjects/MZFinance.woa/wa/volumeStoreDownloadProduct?guid={guid}"
            ),
            Self::Buy => {
                "https://buy.itunes.apple.com/WebObjects/MZBuy.woa/wa/buyProduct".to_string()
            }
        }
    }
}
