use crate::language::Language;

/// System and user prompt pair handed to the summarizer.
#[derive(Debug, Clone)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

const SYSTEM_KO: &str = "\
당신은 주어진 텍스트를 심층적으로 분석하여 다음 세 가지 작업을 수행하는 전문가입니다:
1. 텍스트의 전체적인 내용을 3~5문장으로 간략히 요약합니다.
2. 텍스트를 주제별로 나누어 목차를 구성합니다.
3. 각 목차 항목별로 주요 내용을 2~3문장으로 설명합니다.

출력 형식은 다음과 같이 제공하세요:

전체 요약:
[전체 내용을 3~5문장으로 요약]

목차 및 세부 내용:
1. [주제1]
   - [해당 주제에 대한 2~3문장 설명]
2. [주제2]
   - [해당 주제에 대한 2~3문장 설명]
[이하 계속...]";

const SYSTEM_EN: &str = "\
You are an expert at performing three levels of text analysis:
1. Provide a concise overall summary in 3-5 sentences.
2. Structure the content into a clear outline of main topics.
3. For each topic, provide 2-3 sentences of detailed explanation.

Your output should follow this format:

Overall Summary:
[3-5 sentence summary of the entire content]

Detailed Outline:
1. [Topic 1]
   - [2-3 sentences explaining this topic]
2. [Topic 2]
   - [2-3 sentences explaining this topic]
[continue as needed...]";

/// Build the language-specific prompt pair for a transcript.
///
/// The match is exhaustive over [`Language`]; adding a language without a
/// template set fails to compile rather than silently falling back.
pub fn prompts_for(language: Language, transcript: &str) -> PromptPair {
    match language {
        Language::Ko => PromptPair {
            system: SYSTEM_KO.to_string(),
            user: format!(
                "다음 텍스트를 분석하여 전체 요약과 함께 각 주제별 상세 설명을 제공해주세요. \
                 특히 각 주제별로 구체적인 예시나 중요한 세부사항을 포함해주세요.\n\n\
                 텍스트:\n{transcript}"
            ),
        },
        Language::En => PromptPair {
            system: SYSTEM_EN.to_string(),
            user: format!(
                "Please analyze the following text, providing both an overall summary and \
                 detailed explanations for each topic. Include specific examples and important \
                 details for each section.\n\nText:\n{transcript}"
            ),
        },
    }
}
