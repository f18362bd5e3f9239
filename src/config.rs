pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/filter-excel/";
pub const RESULT_FILE_NAME: &str = "Filtered_Result.xlsx";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub result_file_name: String,
    pub window_size: [f32; 2],
    pub min_window_size: [f32; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            result_file_name: RESULT_FILE_NAME.to_string(),
            window_size: [480.0, 520.0],
            min_window_size: [380.0, 420.0],
        }
    }
}

impl Config {
    /// Same defaults, different endpoint. Used to point the client at a local test server.
    #[cfg(test)]
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }
}
