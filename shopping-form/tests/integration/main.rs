mod form_flow;
mod http_client;
