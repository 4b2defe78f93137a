/// Lookup failures visible to callers of the portfolio service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortfolioError {
    /// The code has no market mapping.
    #[error("Asset not supported")]
    UnsupportedAsset(String),

    /// The market source answered but had no entry for the asset.
    #[error("Asset data not found")]
    AssetNotFound(String),
}
